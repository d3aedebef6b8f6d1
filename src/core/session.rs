use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::ai::prompt::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::ai::{ChatMessage, DispatchError, LlmClient};
use crate::config::Settings;
use crate::core::error::SessionError;
use crate::core::resource::{Resource, SourceKind};
use crate::file::{FileProcessor, RemoteFetcher, ResourceStore, VideoDownloader, RESOURCES_SUBFOLDER};

pub const TRANSLATE_CONTEXT_CHARS: usize = 2000;
pub const ASK_CONTEXT_CHARS: usize = 1000;
pub const ASK_CONTEXT_RESOURCES: usize = 3;

/// State of one user's interaction: their resources, their transcript and the
/// collaborators that act on them. Nothing here outlives the session.
pub struct Session {
    id: Uuid,
    settings: Settings,
    store: ResourceStore,
    fetcher: RemoteFetcher,
    video: VideoDownloader,
    llm: Result<LlmClient, String>,
    resources: Vec<Resource>,
    transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let llm = LlmClient::from_settings(&settings);
        Self::with_llm(settings, llm)
    }

    pub fn with_llm(settings: Settings, llm: Result<LlmClient, DispatchError>) -> anyhow::Result<Self> {
        let store = ResourceStore::new(&settings.upload_folder)?;
        let fetcher = RemoteFetcher::new(settings.request_timeout)?
            .with_size_limit(settings.max_file_size_mb);
        let video = VideoDownloader::new(settings.video_downloader.clone());
        let llm = llm.map_err(|e| {
            warn!(kind = e.kind(), "LLM features disabled: {}", e);
            e.to_string()
        });

        let id = Uuid::new_v4();
        info!(session = %id, upload_folder = %settings.upload_folder.display(), "session started");
        Ok(Self {
            id,
            settings,
            store,
            fetcher,
            video,
            llm,
            resources: Vec::new(),
            transcript: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn llm(&self) -> Result<&LlmClient, SessionError> {
        self.llm
            .as_ref()
            .map_err(|message| SessionError::LlmUnavailable(message.clone()))
    }

    pub fn llm_available(&self) -> bool {
        self.llm.is_ok()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn get(&self, id: Uuid) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// First resource with this display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Accepts a 1-based position in the resource list or a resource id.
    pub fn resolve(&self, reference: &str) -> Result<Uuid, SessionError> {
        let reference = reference.trim();
        let found = if let Ok(index) = reference.parse::<usize>() {
            index.checked_sub(1).and_then(|i| self.resources.get(i))
        } else if let Ok(id) = Uuid::parse_str(reference) {
            self.get(id)
        } else {
            None
        };
        found
            .map(|r| r.id)
            .ok_or_else(|| SessionError::ResourceNotFound(reference.to_string()))
    }

    fn require(&self, id: Uuid) -> Result<&Resource, SessionError> {
        self.get(id)
            .ok_or_else(|| SessionError::ResourceNotFound(id.to_string()))
    }

    fn track(&mut self, name: String, path: PathBuf, source: SourceKind) -> &Resource {
        let size_mb = ResourceStore::size_mb(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), "could not read file size: {}", e);
            0.0
        });
        let resource = Resource::new(name, path, size_mb, source);
        info!(session = %self.id, resource = %resource.id, name = %resource.name, source = resource.source.label(), "resource added");
        self.resources.push(resource);
        &self.resources[self.resources.len() - 1]
    }

    fn check_size(&self, name: &str, bytes: u64) -> Result<(), SessionError> {
        let size_mb = bytes as f64 / (1024.0 * 1024.0);
        if size_mb > self.settings.max_file_size_mb {
            return Err(SessionError::TooLarge {
                name: name.to_string(),
                size_mb,
                limit_mb: self.settings.max_file_size_mb,
            });
        }
        Ok(())
    }

    fn save_bytes(&self, name: &str, content: &[u8]) -> Result<PathBuf, SessionError> {
        if !ResourceStore::is_supported(name) {
            return Err(SessionError::UnsupportedFormat(name.to_string()));
        }
        self.check_size(name, content.len() as u64)?;
        self.store
            .save(name, content, RESOURCES_SUBFOLDER)
            .ok_or_else(|| SessionError::SaveFailed(name.to_string()))
    }

    pub fn upload(&mut self, name: &str, content: &[u8]) -> Result<&Resource, SessionError> {
        let path = self.save_bytes(name, content)?;
        Ok(self.track(name.to_string(), path, SourceKind::LocalUpload))
    }

    /// Reads a local file and uploads it under its own file name.
    pub fn upload_path(&mut self, path: &Path) -> Result<&Resource, SessionError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SessionError::UnsupportedFormat(path.display().to_string()))?
            .to_string();
        if !ResourceStore::is_supported(&name) {
            return Err(SessionError::UnsupportedFormat(name));
        }
        let read_failed = |e: io::Error| {
            warn!(path = %path.display(), "Error reading upload: {}", e);
            SessionError::SaveFailed(name.clone())
        };
        let metadata = std::fs::metadata(path).map_err(read_failed)?;
        self.check_size(&name, metadata.len())?;
        let content = std::fs::read(path).map_err(read_failed)?;
        self.upload(&name, &content)
    }

    pub async fn add_from_url(&mut self, url: &str) -> Result<&Resource, SessionError> {
        let fetched = self.fetcher.fetch(url).await.map_err(|e| {
            warn!(url, "Error fetching resource: {:#}", e);
            SessionError::FetchFailed(format!("{:#}", e))
        })?;
        let path = self.save_bytes(&fetched.file_name, &fetched.content)?;
        Ok(self.track(fetched.file_name, path, SourceKind::DirectUrl))
    }

    pub async fn add_video(&mut self, url: &str) -> Result<&Resource, SessionError> {
        let dest = self.store.resources_dir();
        let path = self.video.download(url, &dest).await.map_err(|e| {
            warn!(url, "Error downloading video: {:#}", e);
            SessionError::FetchFailed(format!("{:#}", e))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(url)
            .to_string();
        Ok(self.track(name, path, SourceKind::RemoteVideo))
    }

    /// Stores pasted course text as `<title>.txt`.
    pub fn add_course_post(&mut self, title: &str, body: &str) -> Result<&Resource, SessionError> {
        let title = title.trim();
        let file_name = format!("{}.txt", title);
        let path = self.save_bytes(&file_name, body.as_bytes())?;
        Ok(self.track(title.to_string(), path, SourceKind::CoursePost))
    }

    /// Deletes the stored file and forgets the resource. A file that is already
    /// gone still drops the entry; other I/O errors keep it.
    pub fn remove(&mut self, id: Uuid) -> Result<Resource, SessionError> {
        let index = self
            .resources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SessionError::ResourceNotFound(id.to_string()))?;

        match self.store.try_delete(&self.resources[index].path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(resource = %id, "file already removed from disk");
            }
            Err(e) => {
                warn!(resource = %id, "Error deleting file: {}", e);
                return Err(SessionError::DeleteFailed(e.to_string()));
            }
        }
        let removed = self.resources.remove(index);
        info!(session = %self.id, resource = %id, name = %removed.name, "resource removed");
        Ok(removed)
    }

    /// Purges old files from the resources folder and drops entries whose file is gone.
    pub fn purge_older_than(&mut self, max_age_hours: u64) -> usize {
        let removed = ResourceStore::purge_older_than(self.store.resources_dir(), max_age_hours);
        self.resources.retain(|r| r.path.exists());
        removed
    }

    pub fn extract(&self, id: Uuid) -> Result<String, SessionError> {
        let resource = self.require(id)?;
        Ok(FileProcessor::extract_text(&resource.path))
    }

    fn extract_non_empty(&self, id: Uuid) -> Result<String, SessionError> {
        let resource = self.require(id)?;
        let text = FileProcessor::extract_text(&resource.path);
        if text.is_empty() {
            return Err(SessionError::NoText(resource.name.clone()));
        }
        Ok(text)
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn summarize(&self, id: Uuid) -> Result<String, SessionError> {
        let llm = self.llm()?;
        let text = self.extract_non_empty(id)?;
        Ok(llm.summarize(&text, None).await)
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn translate(&self, id: Uuid, language: Option<&str>) -> Result<String, SessionError> {
        let llm = self.llm()?;
        let text = self.extract_non_empty(id)?;
        let language = language.unwrap_or(&self.settings.default_language);
        Ok(llm.translate(truncate_chars(&text, TRANSLATE_CONTEXT_CHARS), language).await)
    }

    fn question_context(&self) -> String {
        let mut context = String::new();
        for resource in self.resources.iter().take(ASK_CONTEXT_RESOURCES) {
            let text = FileProcessor::extract_text(&resource.path);
            context.push_str(truncate_chars(&text, ASK_CONTEXT_CHARS));
            context.push('\n');
        }
        context
    }

    /// Answers against the first resources whenever the session holds any, even when
    /// none of them has extractable text. Without resources it is plain chat.
    /// Both the question and the reply are appended to the transcript.
    #[instrument(skip(self, question), fields(session = %self.id))]
    pub async fn ask(&mut self, question: &str) -> Result<String, SessionError> {
        let llm = self.llm()?.clone();
        self.transcript.push(ChatMessage::user(question));

        let context = self.question_context();
        let reply = if context.is_empty() {
            llm.chat(
                vec![ChatMessage::user(question)],
                None,
                DEFAULT_TEMPERATURE,
                DEFAULT_MAX_TOKENS,
            )
            .await
        } else {
            llm.answer_question(&context, question).await
        };

        self.transcript.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    pub async fn find_relevant(&self, query: &str) -> Result<Vec<String>, SessionError> {
        let llm = self.llm()?;
        if self.resources.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = self.resources.iter().map(|r| r.name.clone()).collect();
        Ok(llm.find_relevant(query, &names).await)
    }
}

/// Prefix of at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::llm::tests::MockTransport;
    use crate::ai::{Role, FALLBACK_REPLY};
    use crate::config::keys;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn settings(root: &Path) -> Settings {
        let root = root.to_path_buf();
        Settings::from_lookup(move |key| match key {
            keys::UPLOAD_FOLDER => Some(root.display().to_string()),
            keys::MAX_FILE_SIZE => Some("1".to_string()),
            keys::DEFAULT_LANGUAGE => Some("Italian".to_string()),
            _ => None,
        })
    }

    fn session_with(root: &Path, transport: Arc<MockTransport>) -> Session {
        Session::with_llm(settings(root), Ok(LlmClient::with_transport(transport, "gpt-3.5-turbo"))).unwrap()
    }

    fn offline_session(root: &Path) -> Session {
        Session::new(settings(root)).unwrap()
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_upload_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());

        let resource = session.upload("note.txt", b"0123456789").unwrap().clone();
        assert!(ResourceStore::is_supported("note.txt"));
        assert_eq!(resource.path, tmp.path().join("resources").join("note.txt"));
        assert_eq!(resource.source, SourceKind::LocalUpload);
        assert!((resource.size_mb - 10.0 / 1_048_576.0).abs() < 1e-12);
        assert_eq!(session.extract(resource.id).unwrap(), "0123456789");
        assert_eq!(session.resources().len(), 1);
    }

    #[test]
    fn test_upload_rejects_unsupported_and_oversized() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());

        assert!(matches!(
            session.upload("photo.jpg", b"jpeg"),
            Err(SessionError::UnsupportedFormat(_))
        ));
        let big = vec![b'a'; 2 * 1024 * 1024];
        assert!(matches!(
            session.upload("big.txt", &big),
            Err(SessionError::TooLarge { .. })
        ));
        assert!(session.resources().is_empty());
        assert!(!tmp.path().join("resources").join("big.txt").exists());
    }

    #[test]
    fn test_upload_path_reads_local_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("outside.txt");
        std::fs::write(&source, "from disk").unwrap();
        let mut session = offline_session(&tmp.path().join("root"));

        let id = session.upload_path(&source).unwrap().id;
        assert_eq!(session.extract(id).unwrap(), "from disk");
        assert!(session.upload_path(&tmp.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_upload_path_checks_size_before_reading() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("lecture.mp4");
        std::fs::write(&source, vec![0u8; 2 * 1024 * 1024]).unwrap();
        let mut session = offline_session(&tmp.path().join("root"));

        assert!(matches!(
            session.upload_path(&source),
            Err(SessionError::TooLarge { .. })
        ));
        assert!(session.resources().is_empty());
    }

    #[test]
    fn test_duplicate_names_get_distinct_ids() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());

        let first = session.upload("same.txt", b"one").unwrap().id;
        let second = session.upload("same.txt", b"two").unwrap().id;
        assert_ne!(first, second);
        assert_eq!(session.find_by_name("same.txt").unwrap().id, first);
        assert_eq!(session.get(second).unwrap().name, "same.txt");

        let post = session.add_course_post(" Week 1 ", "Intro to ownership").unwrap().clone();
        assert_eq!(post.name, "Week 1");
        assert_eq!(post.source, SourceKind::CoursePost);
        assert_eq!(session.extract(post.id).unwrap(), "Intro to ownership");
    }

    #[test]
    fn test_resolve_by_index_or_id() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());
        let a = session.upload("a.txt", b"a").unwrap().id;
        let b = session.upload("b.txt", b"b").unwrap().id;

        assert_eq!(session.resolve("1").unwrap(), a);
        assert_eq!(session.resolve(" 2 ").unwrap(), b);
        assert_eq!(session.resolve(&b.to_string()).unwrap(), b);
        assert!(session.resolve("0").is_err());
        assert!(session.resolve("3").is_err());
        assert!(session.resolve("a.txt").is_err());
    }

    #[test]
    fn test_remove_deletes_file_and_entry() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());
        let resource = session.upload("gone.txt", b"bye").unwrap().clone();

        let removed = session.remove(resource.id).unwrap();
        assert_eq!(removed.id, resource.id);
        assert!(!resource.path.exists());
        assert!(session.resources().is_empty());

        assert!(matches!(
            session.remove(resource.id),
            Err(SessionError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_remove_when_file_already_gone() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());
        let resource = session.upload("vanished.txt", b"x").unwrap().clone();
        std::fs::remove_file(&resource.path).unwrap();

        assert!(session.remove(resource.id).is_ok());
        assert!(session.resources().is_empty());
    }

    #[test]
    fn test_purge_drops_missing_entries() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());
        session.upload("old.txt", b"x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert_eq!(session.purge_older_than(0), 1);
        assert!(session.resources().is_empty());
    }

    #[tokio::test]
    async fn test_llm_operations_without_credential() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());
        let id = session.upload("a.txt", b"text").unwrap().id;

        assert!(!session.llm_available());
        let err = session.summarize(id).await.unwrap_err();
        assert!(matches!(err, SessionError::LlmUnavailable(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(session.ask("hi").await.is_err());
        assert!(session.transcript().is_empty());
        // storage keeps working
        assert_eq!(session.extract(id).unwrap(), "text");
    }

    #[tokio::test]
    async fn test_summarize_sends_full_text() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("Summary text");
        let mut session = session_with(tmp.path(), transport.clone());
        let body = "word ".repeat(1000);
        let id = session.upload("long.txt", body.as_bytes()).unwrap().id;

        assert_eq!(session.summarize(id).await.unwrap(), "Summary text");
        assert!(transport.last_prompt().ends_with(&body));
    }

    #[tokio::test]
    async fn test_summarize_storage_only_format_has_no_text() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("unused");
        let mut session = session_with(tmp.path(), transport.clone());
        let id = session.upload("lecture.mp3", b"ID3 audio").unwrap().id;

        assert!(matches!(session.summarize(id).await, Err(SessionError::NoText(_))));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_translate_truncates_and_uses_default_language() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("Testo tradotto");
        let mut session = session_with(tmp.path(), transport.clone());
        let body = "é".repeat(TRANSLATE_CONTEXT_CHARS + 500);
        let id = session.upload("long.txt", body.as_bytes()).unwrap().id;

        assert_eq!(session.translate(id, None).await.unwrap(), "Testo tradotto");
        let prompt = transport.last_prompt();
        assert!(prompt.starts_with("Translate the following text to Italian:\n\n"));
        assert_eq!(prompt.matches('é').count(), TRANSLATE_CONTEXT_CHARS);

        session.translate(id, Some("Hindi")).await.unwrap();
        assert!(transport.last_prompt().contains("to Hindi:"));
    }

    #[tokio::test]
    async fn test_ask_without_resources_uses_plain_chat() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("Hello there");
        let mut session = session_with(tmp.path(), transport.clone());

        assert_eq!(session.ask("Hi!").await.unwrap(), "Hello there");
        assert_eq!(transport.last_prompt(), "Hi!");
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0], ChatMessage::user("Hi!"));
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "Hello there");
    }

    #[tokio::test]
    async fn test_ask_uses_first_three_resources_as_context() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("Answer");
        let mut session = session_with(tmp.path(), transport.clone());
        session.upload("a.txt", "A".repeat(1500).as_bytes()).unwrap();
        session.upload("b.txt", b"bravo").unwrap();
        session.upload("c.txt", b"charlie").unwrap();
        session.upload("d.txt", b"delta").unwrap();

        session.ask("What is in my notes?").await.unwrap();
        let prompt = transport.last_prompt();
        assert!(prompt.contains(&format!("Context:\n{}\nbravo\ncharlie\n", "A".repeat(ASK_CONTEXT_CHARS))));
        assert!(!prompt.contains("delta"));
        assert!(prompt.contains("Question: What is in my notes?"));
    }

    #[tokio::test]
    async fn test_ask_with_storage_only_resource_still_uses_context() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("It covered ownership");
        let mut session = session_with(tmp.path(), transport.clone());
        session.upload("lecture.mp3", b"ID3").unwrap();

        session.ask("What was covered?").await.unwrap();
        let prompt = transport.last_prompt();
        assert!(prompt.starts_with("Based on the following context"));
        assert!(prompt.contains("Context:\n\n\n\nQuestion: What was covered?"));
    }

    #[tokio::test]
    async fn test_ask_failure_records_fallback() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::failing(|| DispatchError::Network("timeout".into()));
        let mut session = session_with(tmp.path(), transport);

        assert_eq!(session.ask("anyone there?").await.unwrap(), FALLBACK_REPLY);
        assert_eq!(session.transcript()[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_find_relevant_sends_all_names() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("rust.txt\n");
        let mut session = session_with(tmp.path(), transport.clone());
        session.upload("rust.txt", b"r").unwrap();
        session.upload("go.txt", b"g").unwrap();

        assert_eq!(session.find_relevant("rust").await.unwrap(), vec!["rust.txt"]);
        assert!(transport.last_prompt().contains("rust.txt\ngo.txt"));
    }

    #[tokio::test]
    async fn test_find_relevant_without_resources_sends_nothing() {
        let tmp = TempDir::new().unwrap();
        let transport = MockTransport::replying("ghost.txt\n");
        let session = session_with(tmp.path(), transport.clone());

        assert!(session.find_relevant("rust").await.unwrap().is_empty());
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_video_failure_adds_nothing() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            video_downloader: tmp.path().join("missing-downloader"),
            ..settings(tmp.path())
        };
        let mut session = Session::with_llm(settings, Err(DispatchError::missing_credential(keys::API_KEY))).unwrap();

        assert!(matches!(
            session.add_video("https://video.example/watch?v=1").await,
            Err(SessionError::FetchFailed(_))
        ));
        assert!(session.resources().is_empty());
    }

    #[tokio::test]
    async fn test_add_from_url_bad_url_adds_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut session = offline_session(tmp.path());

        assert!(matches!(
            session.add_from_url("definitely not a url").await,
            Err(SessionError::FetchFailed(_))
        ));
        assert!(session.resources().is_empty());
    }
}
