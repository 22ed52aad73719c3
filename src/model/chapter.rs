//! Chapters: one converted fragment inside a content section.

use super::Repo;
use crate::ids;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A fragment placed in a content section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Fragment name as written in the TOC (with or without extension)
    pub fragment_name: String,

    /// Repository the fragment was loaded from
    pub repo: Arc<Repo>,

    /// Heading depth offset declared on the chapter
    pub level_offset: i32,

    /// Whether the chapter is laid out rotated
    pub rotated: bool,

    /// Opaque converter configuration
    pub config: Option<String>,

    /// Converted HTML; rewritten once by the post-processing pipeline
    pub html: String,
}

impl Chapter {
    /// Create a chapter from already converted HTML.
    pub fn new(fragment_name: impl Into<String>, repo: Arc<Repo>, html: impl Into<String>) -> Self {
        Self {
            fragment_name: fragment_name.into(),
            repo,
            level_offset: 0,
            rotated: false,
            config: None,
            html: html.into(),
        }
    }

    /// Set the level offset.
    pub fn with_level_offset(mut self, offset: i32) -> Self {
        self.level_offset = offset;
        self
    }

    /// Set the rotation flag.
    pub fn with_rotated(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    /// Set the converter configuration.
    pub fn with_config(mut self, config: Option<String>) -> Self {
        self.config = config;
        self
    }

    /// Heading shift for this chapter inside a section of `section_level`.
    pub fn effective_level(&self, section_level: i32) -> i32 {
        ids::effective_level(self.level_offset, section_level)
    }

    /// Anchor id of this chapter inside the section with `section_id`.
    pub fn id(&self, section_id: &str) -> String {
        ids::chapter_id(section_id, &self.fragment_name)
    }
}
