// Image upload through an `AssetStore`, end to end.

use cms_editor_core::{
    AssetStore, AssetStoreError, Editor, EditorConfig, ImageFile, MemoryAssetStore, Position,
    Selection, UploadError, UploadedAsset, ValidationError,
};

struct FailingStore;

impl AssetStore for FailingStore {
    async fn upload(&self, _file: &ImageFile, _destination: &str) -> Result<UploadedAsset, AssetStoreError> {
        Err(AssetStoreError::new("bucket unavailable"))
    }
}

struct StalledStore;

impl AssetStore for StalledStore {
    async fn upload(&self, _file: &ImageFile, _destination: &str) -> Result<UploadedAsset, AssetStoreError> {
        std::future::pending().await
    }
}

fn editor_with(html: &str) -> Editor {
    let mut editor = Editor::new(EditorConfig::default(), Some(html), |_| {});
    editor.set_selection(Some(Selection::collapsed(Position::new(0, 5))));
    editor
}

fn png(bytes: usize) -> ImageFile {
    ImageFile::new("diagram.png", "image/png", vec![7u8; bytes])
}

#[tokio::test]
async fn test_upload_inserts_durable_url() {
    let store = MemoryAssetStore::new("https://assets.example.com/");
    let mut editor = editor_with("<p>Intro</p>");

    let asset = editor.upload_image(&png(1024), &store).await.unwrap();

    assert!(asset.path.starts_with("article-images/"));
    assert!(asset.path.ends_with(".png"));
    assert_eq!(asset.url, format!("https://assets.example.com/{}", asset.path));
    assert_eq!(store.get(&asset.path).map(|b| b.len()), Some(1024));

    let html = editor.html();
    assert!(html.starts_with("<p>Intro<img "));
    assert!(html.contains(&format!(r#"src="{}""#, asset.url)));
    assert!(html.contains(r#"alt="diagram.png""#));
    assert!(!editor.is_uploading());
}

#[tokio::test]
async fn test_oversized_and_non_image_files_leave_document_unchanged() {
    let store = MemoryAssetStore::new("https://assets.example.com");
    let mut editor = editor_with("<p>Intro</p>");
    let before = editor.html();

    let err = editor.upload_image(&png(6 * 1024 * 1024), &store).await.unwrap_err();
    assert!(matches!(err, UploadError::Validation(ValidationError::TooLarge { .. })));
    assert_eq!(err.user_message(), "File size must be smaller than 5MB.");

    let pdf = ImageFile::new("brief.pdf", "application/pdf", vec![0u8; 10]);
    let err = editor.upload_image(&pdf, &store).await.unwrap_err();
    assert!(matches!(err, UploadError::Validation(ValidationError::NotAnImage { .. })));

    assert_eq!(editor.html(), before);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_store_failure_leaves_document_unchanged() {
    let mut editor = editor_with("<p>Intro</p>");
    let before = editor.html();

    let err = editor.upload_image(&png(10), &FailingStore).await.unwrap_err();
    assert!(matches!(err, UploadError::Store(_)));
    assert!(err.user_message().contains("bucket unavailable"));
    assert_eq!(editor.html(), before);
    assert!(!editor.is_uploading());
    assert!(editor.toolbar_state().can_insert_image());
}

#[tokio::test]
async fn test_stalled_store_times_out() {
    let config = EditorConfig {
        upload_timeout_ms: Some(20),
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(config, Some("<p>Intro</p>"), |_| {});
    let before = editor.html();

    let err = editor.upload_image(&png(10), &StalledStore).await.unwrap_err();
    assert!(matches!(err, UploadError::TimedOut(_)));
    assert_eq!(editor.html(), before);
    assert!(!editor.is_uploading());
}
