//! Interfaces for the third-party services the site talks to directly:
//! object storage for media and an e-mail relay for the contact form.
//!
//! Only the seams and the naming rules live here; the services themselves
//! are black boxes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::ContactForm;

pub const DEFAULT_FOLDER: &str = "general";

#[derive(Debug, Error)]
#[error("{service} request failed: {message}")]
pub struct ExternalError {
    pub service: &'static str,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// An uploaded object and the URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

pub trait ObjectStore {
    /// Upload `bytes` under a fresh key in `folder` and return where it
    /// landed. Existing objects are never overwritten.
    fn upload(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<StoredObject, ExternalError>;

    /// Objects in `folder`, newest first.
    fn list(&self, folder: &str) -> Result<Vec<StoredObject>, ExternalError>;

    fn delete(&self, path: &str) -> Result<(), ExternalError>;
}

/// `{folder}/{unix millis}-{random}.{ext}`. The extension is whatever follows
/// the last dot of `file_name` (the whole name when there is no dot); an
/// empty folder means [`DEFAULT_FOLDER`].
pub fn object_key(folder: &str, file_name: &str, at: DateTime<Utc>, suffix: &str) -> String {
    let folder = if folder.is_empty() { DEFAULT_FOLDER } else { folder };
    let ext = file_name.rsplit('.').next().unwrap_or(file_name);
    format!("{folder}/{}-{suffix}.{ext}", at.timestamp_millis())
}

/// [`object_key`] with the current time and a random suffix.
pub fn new_object_key(folder: &str, file_name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    object_key(folder, file_name, Utc::now(), &suffix)
}

/// Public URL of `path` in a storage bucket.
pub fn public_url(storage_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{bucket}/{}",
        storage_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// E-mail relay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl RelayConfig {
    /// The relay is usable only when every credential is present.
    pub fn is_configured(&self) -> bool {
        [&self.service_id, &self.template_id, &self.public_key]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

/// Template variables sent to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailTemplate {
    pub template_id: String,
    pub params: BTreeMap<String, String>,
}

impl EmailTemplate {
    pub fn contact(template_id: &str, form: &ContactForm) -> Self {
        let mut params = BTreeMap::from([
            ("from_name".to_string(), form.name.clone()),
            ("from_email".to_string(), form.email.clone()),
            ("subject".to_string(), form.subject.clone()),
            ("message".to_string(), form.message.clone()),
        ]);
        if let Some(phone) = &form.phone {
            params.insert("phone".to_string(), phone.clone());
        }
        Self {
            template_id: template_id.to_string(),
            params,
        }
    }
}

pub trait EmailRelay {
    /// Deliver the template and return the relay's status code.
    fn send(&self, template: &EmailTemplate) -> Result<u16, ExternalError>;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap()
    }

    #[test]
    fn key_uses_folder_millis_suffix_and_extension() {
        assert_eq!(
            object_key("avatars", "me.profile.png", at(), "k3x9a"),
            "avatars/1700000000123-k3x9a.png"
        );
    }

    #[test]
    fn empty_folder_defaults_to_general() {
        assert_eq!(object_key("", "cake.jpg", at(), "s"), "general/1700000000123-s.jpg");
    }

    #[test]
    fn name_without_dot_is_its_own_extension() {
        assert_eq!(object_key("f", "README", at(), "s"), "f/1700000000123-s.README");
    }

    #[test]
    fn fresh_keys_differ() {
        let a = new_object_key("general", "a.png");
        let b = new_object_key("general", "a.png");
        assert_ne!(a, b);
        assert!(a.starts_with("general/"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn public_url_joins_cleanly() {
        assert_eq!(
            public_url("https://x.supabase.co/", "media", "/general/a.png"),
            "https://x.supabase.co/storage/v1/object/public/media/general/a.png"
        );
    }

    #[test]
    fn relay_needs_every_credential() {
        let mut config = RelayConfig {
            service_id: "svc".to_string(),
            template_id: "tpl".to_string(),
            public_key: String::new(),
        };
        assert!(!config.is_configured());
        config.public_key = "pk".to_string();
        assert!(config.is_configured());
    }

    /// Keeps uploaded objects in memory, newest last.
    #[derive(Default)]
    struct MemoryStore {
        objects: RefCell<Vec<StoredObject>>,
    }

    impl ObjectStore for MemoryStore {
        fn upload(&self, folder: &str, file_name: &str, _bytes: &[u8]) -> Result<StoredObject, ExternalError> {
            let path = new_object_key(folder, file_name);
            let object = StoredObject {
                url: public_url("https://cdn.example", "media", &path),
                path,
            };
            self.objects.borrow_mut().push(object.clone());
            Ok(object)
        }

        fn list(&self, folder: &str) -> Result<Vec<StoredObject>, ExternalError> {
            let prefix = format!("{folder}/");
            Ok(self
                .objects
                .borrow()
                .iter()
                .rev()
                .filter(|o| o.path.starts_with(&prefix))
                .cloned()
                .collect())
        }

        fn delete(&self, path: &str) -> Result<(), ExternalError> {
            let mut objects = self.objects.borrow_mut();
            let before = objects.len();
            objects.retain(|o| o.path != path);
            if objects.len() == before {
                return Err(ExternalError {
                    service: "storage",
                    message: format!("{path} not found"),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn store_contract_upload_list_delete() {
        let store = MemoryStore::default();
        let first = store.upload("gallery", "a.jpg", b"1").unwrap();
        let second = store.upload("gallery", "b.png", b"2").unwrap();
        store.upload("avatars", "c.jpg", b"3").unwrap();

        let listed = store.list("gallery").unwrap();
        assert_eq!(listed, vec![second.clone(), first.clone()]);
        assert!(first.url.ends_with(&first.path));

        store.delete(&first.path).unwrap();
        assert_eq!(store.list("gallery").unwrap(), vec![second]);
        let err = store.delete(&first.path).unwrap_err();
        assert_eq!(err.to_string(), format!("storage request failed: {} not found", first.path));
    }

    #[test]
    fn contact_template_carries_form_fields() {
        let form = ContactForm {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: None,
            subject: "Hello".to_string(),
            message: "I'd like to work together.".to_string(),
        };
        let template = EmailTemplate::contact("tpl", &form);
        assert_eq!(template.params["from_email"], "alice@example.com");
        assert!(!template.params.contains_key("phone"));
    }
}
