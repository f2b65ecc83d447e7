use tracing::{debug, info, warn};

use crate::backend::CatalogBackend;
use crate::episode::{Episode, EpisodeEdit, EpisodeId};
use crate::error::{CatalogError, CatalogResult};

/// Edit session for a single episode, addressed by storage id.
///
/// `form` holds the caller's pending edits; it is seeded by `load` and by a successful `save`. A failed save
/// leaves it alone. A failed load of a different id drops the loaded record and its form.
pub struct AdminEditController<'b, B: CatalogBackend + ?Sized> {
  backend: &'b B,
  current: Option<Episode>,
  pub form: EpisodeEdit,
  pub last_error: Option<String>,
  pub info_message: Option<String>,
}

impl<'b, B: CatalogBackend + ?Sized> AdminEditController<'b, B> {
  pub fn new(backend: &'b B) -> Self {
    Self { backend, current: None, form: EpisodeEdit::default(), last_error: None, info_message: None }
  }

  /// The record as last returned by the backend.
  pub fn current(&self) -> Option<&Episode> {
    self.current.as_ref()
  }

  pub fn dismiss_error(&mut self) {
    self.last_error = None;
  }

  pub async fn load(&mut self, id: &EpisodeId) -> CatalogResult<&Episode> {
    self.last_error = None;
    self.info_message = None;
    match self.backend.fetch_by_id(id).await {
      Ok(ep) => {
        debug!(id = %id, "admin: episode loaded");
        self.form = EpisodeEdit::from(&ep);
        Ok(&*self.current.insert(ep))
      }
      Err(e) => {
        // A record from an earlier load must not stay on screen as if it were this id.
        if e.is_not_found() || self.current.as_ref().is_some_and(|c| &c.id != id) {
          self.current = None;
          self.form = EpisodeEdit::default();
        }
        self.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  /// Send `edit` for `id` and adopt the stored result.
  ///
  /// The response replaces the local record wholesale; a response for an id other than the loaded one is returned
  /// but not adopted.
  pub async fn save(&mut self, id: &EpisodeId, edit: EpisodeEdit) -> CatalogResult<Episode> {
    self.last_error = None;
    self.info_message = None;
    if let Err(e) = edit.validate() {
      self.last_error = Some(e.to_string());
      return Err(e);
    }

    let updated = match self.backend.update(id, &edit).await {
      Ok(ep) => ep,
      Err(e) => {
        warn!(id = %id, err = %e, "admin: save failed");
        self.last_error = Some(e.to_string());
        return Err(e);
      }
    };

    if &updated.id != id {
      let e = CatalogError::Transient(format!("backend answered for {} instead of {}", updated.id, id));
      self.last_error = Some(e.to_string());
      return Err(e);
    }

    info!(id = %id, published = updated.published, "admin: episode saved");
    if self.current.as_ref().is_some_and(|c| &c.id == id) {
      self.form = EpisodeEdit::from(&updated);
      self.current = Some(updated.clone());
      self.info_message = Some("Episode updated.".to_string());
    } else {
      debug!(id = %id, "admin: save result for a record that is no longer loaded");
    }
    Ok(updated)
  }

  /// Save the pending form for the loaded record.
  pub async fn save_form(&mut self) -> CatalogResult<Episode> {
    let Some(id) = self.current.as_ref().map(|c| c.id.clone()) else {
      return Err(CatalogError::NotFound("no episode loaded".to_string()));
    };
    let edit = self.form.clone();
    self.save(&id, edit).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::MemoryBackend;
  use crate::episode::sample;

  fn catalog() -> Vec<Episode> {
    let mut a = sample("a", "Primeiro");
    a.description = "<p>desc</p>".to_string();
    a.episode_number = Some(1);
    a.season = Some(1);
    a.audio_url = Some("https://cdn.example/a.mp3".to_string());
    vec![a, sample("b", "Segundo")]
  }

  #[tokio::test]
  async fn load_seeds_form() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    let ep = ctl.load(&"a".into()).await.unwrap();
    assert_eq!(ep.title, "Primeiro");
    assert_eq!(ctl.form.title, "Primeiro");
    assert_eq!(ctl.form.description, "<p>desc</p>");
    assert!(ctl.form.published);
  }

  #[tokio::test]
  async fn load_unknown_is_not_found() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    let err = ctl.load(&"unknown-id".into()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(ctl.current().is_none());
    assert!(ctl.last_error.is_some());
  }

  #[tokio::test]
  async fn transient_load_failure_is_distinct() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    backend.fail_next(CatalogError::Transient("offline".to_string()));
    let err = ctl.load(&"a".into()).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_not_found());
  }

  #[tokio::test]
  async fn failed_load_of_other_id_drops_previous_record() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();

    backend.fail_next(CatalogError::Transient("offline".to_string()));
    assert!(ctl.load(&"b".into()).await.is_err());
    assert!(ctl.current().is_none());
    assert_eq!(ctl.form, EpisodeEdit::default());

    ctl.form.title = "Para o B".to_string();
    let err = ctl.save_form().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(backend.call_count("update"), 0);
    assert_eq!(backend.snapshot()[0].title, "Primeiro");
  }

  #[tokio::test]
  async fn transient_reload_of_same_id_keeps_pending_edits() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();
    ctl.form.title = "Rascunho".to_string();

    backend.fail_next(CatalogError::Transient("offline".to_string()));
    assert!(ctl.load(&"a".into()).await.is_err());
    assert_eq!(ctl.current().unwrap().id.as_str(), "a");
    assert_eq!(ctl.form.title, "Rascunho");
  }

  #[tokio::test]
  async fn save_unknown_is_not_found_and_collection_unchanged() {
    let backend = MemoryBackend::with(catalog());
    let before = backend.snapshot();
    let mut ctl = AdminEditController::new(&backend);
    let edit = EpisodeEdit { title: "x".to_string(), description: String::new(), published: false };
    let err = ctl.save(&"unknown-id".into(), edit).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(backend.snapshot(), before);
  }

  #[tokio::test]
  async fn save_adopts_authoritative_response() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();

    ctl.form.title = "Novo título".to_string();
    ctl.form.description = "  <p>editado</p>\n".to_string();
    ctl.form.published = false;
    let saved = ctl.save_form().await.unwrap();

    // storage trimmed the body; the controller shows what was stored, not what was sent
    assert_eq!(saved.description, "<p>editado</p>");
    assert_eq!(ctl.current().unwrap().description, "<p>editado</p>");
    assert_eq!(ctl.form.description, "<p>editado</p>");
    assert!(ctl.current().unwrap().updated_at.is_some());
    assert!(ctl.info_message.is_some());
  }

  #[tokio::test]
  async fn save_cannot_touch_identity_fields() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();
    let edit = EpisodeEdit { title: "Outro".to_string(), description: String::new(), published: true };
    let saved = ctl.save(&"a".into(), edit).await.unwrap();
    assert_eq!(saved.guid.as_deref(), Some("guid-a"));
    assert_eq!(saved.episode_number, Some(1));
    assert_eq!(saved.season, Some(1));
    assert_eq!(saved.audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
  }

  #[tokio::test]
  async fn failed_save_keeps_form_and_record() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();
    ctl.form.title = "Rascunho".to_string();

    backend.fail_next(CatalogError::Validation("description too long".to_string()));
    let err = ctl.save_form().await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert_eq!(ctl.form.title, "Rascunho");
    assert_eq!(ctl.current().unwrap().title, "Primeiro");
    assert_eq!(ctl.last_error.as_deref(), Some("rejected: description too long"));
  }

  #[tokio::test]
  async fn blank_title_never_reaches_backend() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    let edit = EpisodeEdit { title: " ".to_string(), ..Default::default() };
    assert!(ctl.save(&"a".into(), edit).await.is_err());
    assert_eq!(backend.call_count("update"), 0);
  }

  #[tokio::test]
  async fn save_for_other_record_is_not_adopted() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();
    let edit = EpisodeEdit { title: "B editado".to_string(), ..Default::default() };
    let saved = ctl.save(&"b".into(), edit).await.unwrap();
    assert_eq!(saved.title, "B editado");
    assert_eq!(ctl.current().unwrap().id.as_str(), "a");
    assert_eq!(ctl.form.title, "Primeiro");
  }

  #[tokio::test]
  async fn save_does_not_refresh_lists() {
    let backend = MemoryBackend::with(catalog());
    let mut ctl = AdminEditController::new(&backend);
    ctl.load(&"a".into()).await.unwrap();
    ctl.save_form().await.unwrap();
    assert_eq!(backend.call_count("fetch_all"), 0);
    assert_eq!(backend.call_count("fetch_published"), 0);
  }
}
