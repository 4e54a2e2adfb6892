//! Footer composer: one collapsible section per top-level menu item.

use anydays_core::{Menu, MenuItem};

/// A nested footer link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterLink {
    pub id: String,
    pub title: String,
    pub to: String,
    pub target: &'static str,
    /// Absolute `http(s)` links render as a plain anchor with
    /// `rel="noopener noreferrer"`.
    pub plain_anchor: bool,
}

impl From<&MenuItem> for FooterLink {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            to: item.to.clone(),
            target: item.target.as_str(),
            plain_anchor: item.to.starts_with("http"),
        }
    }
}

/// One footer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterSection {
    pub id: String,
    pub title: String,
    pub links: Vec<FooterLink>,
}

impl FooterSection {
    /// Sections with nested links get a disclosure toggle.
    #[must_use]
    pub fn has_toggle(&self) -> bool {
        !self.links.is_empty()
    }
}

/// The footer's section list.
///
/// Each toggle renders as its own `<details>` element, collapsed on mobile
/// and forced open on desktop by the stylesheet. The browser keeps each
/// one's open state, so expanding one section never touches another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FooterAccordion {
    sections: Vec<FooterSection>,
}

impl FooterAccordion {
    /// Build collapsed sections from the footer menu.
    #[must_use]
    pub fn from_menu(menu: &Menu) -> Self {
        let sections = menu
            .items
            .iter()
            .map(|item| FooterSection {
                id: item.id.clone(),
                title: item.title.clone(),
                links: item.items.iter().map(FooterLink::from).collect(),
            })
            .collect();

        Self { sections }
    }

    #[must_use]
    pub fn sections(&self) -> &[FooterSection] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, id: &str) -> Option<&FooterSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}
