//! Interactive outline editing between outline synthesis and content
//! generation.
//!
//! The editor owns a deep-copied working set of slides, tracks whether it
//! has diverged from the last synced state, and pushes the whole sequence
//! back to the service in one save. Slide indices are normalized after
//! every structural edit so the wire payload always carries a contiguous
//! `index` per slide.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::DeckflowError;
use crate::service::{GenerationService, Outline, OutlineSlide};

/// Local, editable copy of a deck outline.
pub struct OutlineEditor {
    service: Arc<dyn GenerationService>,
    slides: Vec<OutlineSlide>,
    session_id: Option<String>,
    dirty: bool,
    selected: Option<usize>,
}

impl OutlineEditor {
    /// Creates an empty editor over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            slides: Vec::new(),
            session_id: None,
            dirty: false,
            selected: None,
        }
    }

    /// Loads a deep copy of the outline's slides for editing.
    ///
    /// Clears the dirty flag and any selection; edits never touch the
    /// caller's outline.
    pub fn load(&mut self, outline: &Outline, session_id: impl Into<String>) {
        self.slides = outline.slides.clone();
        self.session_id = Some(session_id.into());
        self.dirty = false;
        self.selected = None;
        self.reindex();
    }

    /// Merges a field patch into one slide.
    ///
    /// Out-of-range indices are a logged no-op. The slide's `index` field
    /// is reasserted after the merge so a patch cannot desynchronize it.
    ///
    /// # Errors
    ///
    /// [`DeckflowError::Serialization`] if the patched slide no longer
    /// parses as a slide.
    pub fn update_slide(
        &mut self,
        index: usize,
        patch: Map<String, Value>,
    ) -> Result<(), DeckflowError> {
        let Some(slide) = self.slides.get_mut(index) else {
            tracing::warn!(index, "update_slide ignored: index out of range");
            return Ok(());
        };
        let mut value = serde_json::to_value(&*slide)?;
        if let Value::Object(fields) = &mut value {
            fields.extend(patch);
        }
        *slide = serde_json::from_value(value)?;
        slide.extra.insert("index".to_string(), Value::from(index));
        self.dirty = true;
        Ok(())
    }

    /// Appends a blank content slide, selects it, and returns its index.
    pub fn add_slide(&mut self) -> usize {
        let index = self.slides.len();
        let mut slide = OutlineSlide::new("New slide");
        slide.slide_type = Some("content".to_string());
        slide.extra.insert("index".to_string(), Value::from(index));
        self.slides.push(slide);
        self.selected = Some(index);
        self.dirty = true;
        index
    }

    /// Removes one slide and re-indexes the rest.
    ///
    /// A selection on the removed slide is cleared; selections after it
    /// shift down with their slide.
    pub fn delete_slide(&mut self, index: usize) {
        if index >= self.slides.len() {
            tracing::warn!(index, "delete_slide ignored: index out of range");
            return;
        }
        self.slides.remove(index);
        self.reindex();
        self.selected = match self.selected {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        self.dirty = true;
    }

    /// Moves one slide to a new position, shifting the slides between.
    ///
    /// A selection follows its slide. Out-of-range endpoints and
    /// `from == to` are no-ops.
    pub fn move_slide(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        if from >= self.slides.len() || to >= self.slides.len() {
            tracing::warn!(from, to, "move_slide ignored: index out of range");
            return;
        }
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        self.reindex();
        self.selected = self.selected.map(|sel| {
            if sel == from {
                to
            } else if from < sel && to >= sel {
                sel - 1
            } else if from > sel && to <= sel {
                sel + 1
            } else {
                sel
            }
        });
        self.dirty = true;
    }

    /// Selects a slide for preview, or clears the selection.
    ///
    /// Out-of-range indices leave the selection unchanged.
    pub fn select(&mut self, index: Option<usize>) {
        match index {
            Some(i) if i >= self.slides.len() => {}
            other => self.selected = other,
        }
    }

    /// Pushes the edited slide sequence back to the service.
    ///
    /// Clears the dirty flag on success; a failed save leaves both the
    /// slides and the flag untouched, so re-saving is always safe.
    ///
    /// # Errors
    ///
    /// [`DeckflowError::Service`] when no outline has been loaded, plus
    /// whatever the service call itself returns.
    pub async fn save(&mut self) -> Result<(), DeckflowError> {
        let Some(session_id) = self.session_id.clone() else {
            return Err(DeckflowError::service("no outline loaded to save"));
        };
        self.service.update_outline(&session_id, &self.slides).await?;
        self.dirty = false;
        Ok(())
    }

    /// Returns the working slides.
    #[must_use]
    pub fn slides(&self) -> &[OutlineSlide] {
        &self.slides
    }

    /// Returns the number of working slides.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Returns true if the working set has unsaved edits.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the selected slide index.
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Returns the selected slide, if one is selected.
    #[must_use]
    pub fn selected_slide(&self) -> Option<&OutlineSlide> {
        self.selected.and_then(|i| self.slides.get(i))
    }

    /// Returns the session the loaded outline belongs to.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn reindex(&mut self) {
        for (i, slide) in self.slides.iter_mut().enumerate() {
            slide.extra.insert("index".to_string(), Value::from(i));
        }
    }
}
