use crate::helper::document_access;
use crate::helper::form_helpers::{require, FormError, FormMode, ParsedForm};
use crate::models::db_operations::documents_db_operations::DocumentStore;
use crate::models::document::{Collection, DocumentWrite};
use crate::models::{Impact, NewsItem};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub impact: String,
}

impl NewsDraft {
    pub fn blank() -> Self {
        NewsDraft {
            title: String::new(),
            content: String::new(),
            impact: Impact::default().as_str().to_string(),
        }
    }

    pub fn from_news(item: &NewsItem) -> Self {
        NewsDraft {
            title: item.title.clone(),
            content: item.content.clone(),
            impact: item.impact.as_str().to_string(),
        }
    }

    pub fn from_form(form: &ParsedForm) -> Self {
        NewsDraft {
            title: form.get("title").unwrap_or_default().to_string(),
            content: form.get("content").unwrap_or_default().to_string(),
            impact: form
                .get("impact")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(Impact::default().as_str())
                .to_string(),
        }
    }

    /// Fields shared by create and edit. Never includes the timestamp or the active flag.
    pub fn to_write(&self) -> Result<DocumentWrite, FormError> {
        require(&self.title, "Title")?;
        require(&self.content, "Content")?;
        let impact: Impact = self
            .impact
            .parse()
            .map_err(|_| FormError::InvalidImpact(self.impact.clone()))?;

        Ok(DocumentWrite::new()
            .set("title", self.title.as_str())
            .set("content", self.content.as_str())
            .set("impact", impact.as_str()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsFormController {
    mode: FormMode,
    draft: NewsDraft,
    error: Option<String>,
}

impl NewsFormController {
    pub fn closed() -> Self {
        NewsFormController { mode: FormMode::Closed, draft: NewsDraft::blank(), error: None }
    }

    pub fn creating() -> Self {
        NewsFormController { mode: FormMode::Creating, draft: NewsDraft::blank(), error: None }
    }

    pub fn editing(item: &NewsItem) -> Self {
        NewsFormController {
            mode: FormMode::Editing { id: item.id.clone() },
            draft: NewsDraft::from_news(item),
            error: None,
        }
    }

    pub fn resume(form: &ParsedForm) -> Self {
        NewsFormController {
            mode: FormMode::from_editing_id(form.get("editing_id")),
            draft: NewsDraft::from_form(form),
            error: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &NewsDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cancel(&mut self) {
        *self = Self::closed();
    }

    /// New items start active with a server-assigned timestamp; edits write
    /// only title, content, and impact. Same result contract as the service form.
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
            FormMode::Creating => {
                let write = write.server_timestamp("createdAt").set("isActive", true);
                document_access::create(store, Collection::News, &write)
            }
            FormMode::Editing { id } => document_access::update(store, Collection::News, id, &write),
        };

        if saved {
            *self = Self::closed();
        }
        Ok(saved)
    }
}
