use crate::helper::document_access;
use crate::helper::form_helpers::{coerce_f64, coerce_i64, require, FormError, FormMode, ParsedForm};
use crate::models::db_operations::documents_db_operations::DocumentStore;
use crate::models::document::{Collection, DocumentWrite};
use crate::models::Service;
use serde::Serialize;

/// The in-progress service record. Numeric fields hold the raw input text
/// until submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDraft {
    pub title: String,
    pub duration: String,
    pub highlights: Vec<String>,
    pub order: String,
    pub price: String,
    pub contact_number: String,
}

impl ServiceDraft {
    pub fn blank() -> Self {
        ServiceDraft {
            title: String::new(),
            duration: String::new(),
            highlights: vec![String::new()],
            order: "0".to_string(),
            price: "0".to_string(),
            contact_number: String::new(),
        }
    }

    pub fn from_service(service: &Service) -> Self {
        let highlights = if service.highlights.is_empty() {
            vec![String::new()]
        } else {
            service.highlights.clone()
        };
        ServiceDraft {
            title: service.title.clone(),
            duration: service.duration.clone(),
            highlights,
            order: service.order.to_string(),
            price: service.price.to_string(),
            contact_number: service.contact_number.clone(),
        }
    }

    pub fn from_form(form: &ParsedForm) -> Self {
        let field = |key: &str| form.get(key).unwrap_or_default().to_string();
        let mut highlights = form.get_all("highlights");
        if highlights.is_empty() {
            highlights.push(String::new());
        }
        ServiceDraft {
            title: field("title"),
            duration: field("duration"),
            highlights,
            order: field("order"),
            price: field("price"),
            contact_number: field("contact_number"),
        }
    }

    /// Blank highlight entries are dropped here and nowhere else.
    pub fn filtered_highlights(&self) -> Vec<String> {
        self.highlights
            .iter()
            .filter(|h| !h.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Validates required fields, coerces numbers, and builds the full write.
    pub fn to_write(&self) -> Result<DocumentWrite, FormError> {
        require(&self.title, "Title")?;
        require(&self.duration, "Duration")?;
        require(&self.contact_number, "Contact number")?;
        let price = coerce_f64(&self.price, "Price")?;
        let order = coerce_i64(&self.order, "Order")?;

        Ok(DocumentWrite::new()
            .set("title", self.title.as_str())
            .set("duration", self.duration.as_str())
            .set("highlights", self.filtered_highlights())
            .set("order", order)
            .set("price", price)
            .set("whatsappNumber", self.contact_number.as_str()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceFormController {
    mode: FormMode,
    draft: ServiceDraft,
    error: Option<String>,
}

impl ServiceFormController {
    pub fn closed() -> Self {
        ServiceFormController { mode: FormMode::Closed, draft: ServiceDraft::blank(), error: None }
    }

    pub fn creating() -> Self {
        ServiceFormController { mode: FormMode::Creating, draft: ServiceDraft::blank(), error: None }
    }

    pub fn editing(service: &Service) -> Self {
        ServiceFormController {
            mode: FormMode::Editing { id: service.id.clone() },
            draft: ServiceDraft::from_service(service),
            error: None,
        }
    }

    /// Picks a submitted form back up: its mode from the hidden id, its draft from the fields.
    pub fn resume(form: &ParsedForm) -> Self {
        ServiceFormController {
            mode: FormMode::from_editing_id(form.get("editing_id")),
            draft: ServiceDraft::from_form(form),
            error: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &ServiceDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn add_highlight(&mut self) {
        self.draft.highlights.push(String::new());
    }

    pub fn update_highlight(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.draft.highlights.get_mut(index) {
            *slot = value.to_string();
        }
    }

    /// The last remaining entry is never removed.
    pub fn remove_highlight(&mut self, index: usize) {
        if self.draft.highlights.len() > 1 && index < self.draft.highlights.len() {
            self.draft.highlights.remove(index);
        }
    }

    pub fn cancel(&mut self) {
        *self = Self::closed();
    }

    /// Creates or updates the record. `Ok(true)` means saved and closed;
    /// `Ok(false)` means the backend failed (already logged) and the form stays
    /// open with its draft. Validation problems come back as `Err` and are also
    /// kept for display.
    pub fn submit(&mut self, store: &dyn DocumentStore) -> Result<bool, FormError> {
        if !self.mode.is_open() {
            return Err(FormError::NotOpen);
        }
        let write = match self.draft.to_write() {
            Ok(write) => write,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        let saved = match &self.mode {
            FormMode::Closed => return Err(FormError::NotOpen),
            FormMode::Creating => document_access::create(store, Collection::Services, &write),
            FormMode::Editing { id } => document_access::update(store, Collection::Services, id, &write),
        };

        if saved {
            *self = Self::closed();
        }
        Ok(saved)
    }
}
