//! Client-side filtering of fetched lists.
//!
//! List endpoints return whole collections; the admin pages narrow them with
//! a case-insensitive substring match over each entity's display fields. An
//! empty term matches everything.

use crate::types::{ContactMessage, Post, Project, User};

pub trait Searchable {
    /// Fields the search box looks at.
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.matches(term)).collect()
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.username.as_str(), self.email.as_str()];
        fields.extend(self.full_name.as_deref());
        fields
    }
}

impl Searchable for Post {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

impl Searchable for Project {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

impl Searchable for ContactMessage {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.subject.as_str()]
    }
}
