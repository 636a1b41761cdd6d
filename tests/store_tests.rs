use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use photofeed::host::{HostEnvironment, View};
use photofeed::prefs::{CONFIG_KEY, FilePrefs, MemoryPrefs, PrefStore};
use photofeed::schema::ParamTheming;
use photofeed::theme::{LocalThemeFetcher, THEME_FILE, ThemeFetcher, ThemeStatus};
use photofeed::{Completion, ConfigStore, Error, ErrorKind, LifecycleState, Result, Value};

const PARENT: &str = "https://example.com/gallery/page";
const SERVE_TIME: i64 = 1_700_000_000_000;

struct NoTheme;

impl ThemeFetcher for NoTheme {
    async fn fetch(&self, _url: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Preferences whose reads can be switched to fail at the storage layer.
#[derive(Clone, Default)]
struct FlakyPrefs {
    inner: MemoryPrefs,
    broken: Arc<AtomicBool>,
}

impl PrefStore for FlakyPrefs {
    fn get(&self, key: &str) -> Result<String> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::runtime("preference storage unavailable"));
        }
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }
}

/// Preferences whose writes can be switched to fail.
#[derive(Default)]
struct ReadOnlyPrefs {
    inner: MemoryPrefs,
    locked: Arc<AtomicBool>,
}

impl PrefStore for ReadOnlyPrefs {
    fn get(&self, key: &str) -> Result<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(Error::runtime("disk full"));
        }
        self.inner.set(key, value)
    }
}

fn host(view: View, serve_time: i64) -> HostEnvironment {
    HostEnvironment {
        view,
        parent: PARENT.into(),
        serve_time,
        ..HostEnvironment::default()
    }
}

async fn config_store<P: PrefStore>(prefs: P, serve_time: i64) -> ConfigStore<P> {
    let mut store = ConfigStore::new(host(View::Config, serve_time), prefs);
    store.init(&NoTheme).await.unwrap();
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saved_values_survive_a_file_backed_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.yaml");

    let mut store = config_store(FilePrefs::new(&path), SERVE_TIME).await;
    assert_eq!(store.state(), LifecycleState::Ready);
    assert!(store.is_new_config());
    assert!(store.save("grid", "2, 3,3").unwrap());
    assert!(store.save("shapeStyleA", "Round %").unwrap());
    assert!(store.save("text", "Hello, world: again").unwrap());
    assert!(store.save("hoverColor", "rgb(0, 128, 255)").unwrap());

    let reopened = config_store(FilePrefs::new(&path), SERVE_TIME + 1).await;
    assert_eq!(reopened.state(), LifecycleState::Ready);
    assert!(!reopened.is_new_config());
    assert_eq!(reopened.value("grid"), Some(&Value::ints([2, 3, 3])));
    assert_eq!(reopened.to_text("shapeStyleA").unwrap(), "Round %");
    assert_eq!(reopened.value("text"), Some(&Value::text("Hello, world: again")));
    assert_eq!(reopened.value("hoverColor"), Some(&Value::text("#0080FF")));
    assert_eq!(reopened.value("origParent"), Some(&Value::text(PARENT)));
    assert_eq!(reopened.value("serveTime"), Some(&Value::Int(SERVE_TIME + 1)));
    assert_eq!(reopened.revert_text(), store.to_wire_text());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupted_blob_leaves_store_errored_at_defaults() {
    let first = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    let blob = first.to_wire_text();
    let corrupted = blob.replacen(",0,", ",1,", 1);
    assert_ne!(blob, corrupted);

    let mut store = config_store(MemoryPrefs::with(CONFIG_KEY, &corrupted), SERVE_TIME).await;
    assert_eq!(store.state(), LifecycleState::Errored);
    let err = store.error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.text(), "CONFIG ERROR\nConfig read error: Data Integrity Fail");
    assert_eq!(store.value("padding"), Some(&Value::Int(0)));

    // The editor can still write a fresh, valid blob.
    assert!(store.save("padding", "2").unwrap());
    let repaired = store.prefs().get(CONFIG_KEY).unwrap();
    let reopened = config_store(MemoryPrefs::with(CONFIG_KEY, &repaired), SERVE_TIME).await;
    assert_eq!(reopened.state(), LifecycleState::Ready);
    assert_eq!(reopened.value("padding"), Some(&Value::Int(2)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wire_text_round_trip_resets_theme_only_parameters() {
    let mut store = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    store.set("padding", Value::Int(7)).unwrap();
    store.set("langNext", Value::text("Onward")).unwrap();
    let blob = store.to_wire_text();

    store.set("padding", Value::Int(1)).unwrap();
    store.from_wire_text(&blob).unwrap();
    assert_eq!(store.value("padding"), Some(&Value::Int(7)));
    assert_eq!(store.value("langNext"), Some(&Value::text("Next")));

    let err = store.from_wire_text("0,garbage").unwrap_err();
    assert_eq!(err.cause(), "Config read error: Data Integrity Fail");
    assert_eq!(store.value("padding"), Some(&Value::Int(7)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reinit_after_fatal_fault_restores_last_ready_configuration() {
    let prefs = FlakyPrefs::default();
    let broken = prefs.broken.clone();
    let mut store = config_store(prefs, SERVE_TIME).await;
    assert!(store.save("padding", "6").unwrap());

    broken.store(true, Ordering::SeqCst);
    let err = store.init(&NoTheme).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(store.state(), LifecycleState::Ready);
    assert_eq!(store.value("padding"), Some(&Value::Int(6)));
    assert_eq!(store.generation(), 2);

    broken.store(false, Ordering::SeqCst);
    assert_eq!(store.init(&NoTheme).await.unwrap(), LifecycleState::Ready);
    assert_eq!(store.value("padding"), Some(&Value::Int(6)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fatal_fault_without_prior_ready_state_errors() {
    let prefs = FlakyPrefs::default();
    prefs.broken.store(true, Ordering::SeqCst);
    let mut store = ConfigStore::new(host(View::Config, SERVE_TIME), prefs);
    assert!(store.init(&NoTheme).await.unwrap_err().is_fatal());
    assert_eq!(store.state(), LifecycleState::Errored);
    assert_eq!(store.error().unwrap().kind(), ErrorKind::Runtime);
}

#[test]
fn only_the_latest_init_completes() {
    let mut store = ConfigStore::new(host(View::Config, SERVE_TIME), MemoryPrefs::new());
    let stale = store.begin_init().unwrap().unwrap();
    let current = store.begin_init().unwrap().unwrap();
    assert_eq!(stale.theme_url, current.theme_url);
    assert_eq!(
        current.theme_url,
        format!("https://example.com/{THEME_FILE}")
    );

    let document = r#"<theme><option name="Late"><p name="padding" value="3"/></option></theme>"#;
    assert_eq!(
        store.complete_init(&stale, Some(document.into())).unwrap(),
        Completion::Stale
    );
    assert_eq!(store.value("padding"), Some(&Value::Int(0)));
    assert_eq!(
        store.complete_init(&current, None).unwrap(),
        Completion::Applied(LifecycleState::Ready)
    );
    assert_eq!(store.theme_status(), ThemeStatus::Unavailable);
    assert_eq!(
        store.complete_init(&current, None).unwrap(),
        Completion::Stale
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn long_deferred_cache_is_switched_off_on_first_init() {
    let mut store = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    assert!(store.save("deferCache", "yes").unwrap());
    let blob = store.prefs().get(CONFIG_KEY).unwrap();

    let recent = config_store(MemoryPrefs::with(CONFIG_KEY, &blob), SERVE_TIME + 1_000).await;
    assert_eq!(recent.value("deferCache"), Some(&Value::Bool(true)));

    let stale = config_store(MemoryPrefs::with(CONFIG_KEY, &blob), SERVE_TIME + 5_000_000).await;
    assert_eq!(stale.value("deferCache"), Some(&Value::Bool(false)));
    let written = stale.prefs().get(CONFIG_KEY).unwrap();
    assert_ne!(written, blob);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn home_view_reads_without_writing_and_checks_sizing() {
    let mut editor = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    assert!(editor.save("grid", "1,4").unwrap());
    let blob = editor.prefs().get(CONFIG_KEY).unwrap();

    let mut short = host(View::Home, SERVE_TIME);
    short.height = Some(300);
    let mut store = ConfigStore::new(short, MemoryPrefs::with(CONFIG_KEY, &blob));
    assert_eq!(store.init(&NoTheme).await.unwrap(), LifecycleState::Errored);
    assert_eq!(
        store.error().unwrap().cause(),
        "Gadget height is not sufficient for 4 photos in column 2 with configured metrics"
    );
    assert!(store.save("padding", "1").unwrap_err().is_fatal());

    let mut tall = host(View::Home, SERVE_TIME);
    tall.height = Some(800);
    let mut store = ConfigStore::new(tall, MemoryPrefs::with(CONFIG_KEY, &blob));
    assert_eq!(store.init(&NoTheme).await.unwrap(), LifecycleState::Ready);
    assert_eq!(store.prefs().get(CONFIG_KEY).unwrap(), blob);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_to_default_skips_themed_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let themes = dir.path().join("site");
    std::fs::create_dir_all(themes.join("sys/themes")).unwrap();
    std::fs::write(
        themes.join(THEME_FILE),
        r#"<theme><option name="Calm"><p name="padding" value="5"/><p name="footerHeight" default="30"/></option></theme>"#,
    )
    .unwrap();

    let mut store = ConfigStore::new(host(View::Config, SERVE_TIME), MemoryPrefs::new());
    let fetcher = LocalThemeFetcher::new(Some(themes));
    assert_eq!(store.init(&fetcher).await.unwrap(), LifecycleState::Ready);
    assert_eq!(store.theme_status(), ThemeStatus::Optional);
    assert_eq!(store.theming("footerHeight"), ParamTheming::Default);

    assert!(store.save("footerHeight", "40").unwrap());
    assert!(!store.reset_to_default("padding").unwrap());
    assert!(!store.reset_to_default("footerHeight").unwrap());
    assert!(!store.reset_to_default("cabName").unwrap());
    assert!(!store.reset_to_default("theme").unwrap());

    assert!(store.save("refHeight", "500").unwrap());
    assert!(store.reset_to_default("refHeight").unwrap());
    store.commit().unwrap();
    assert_eq!(store.value("refHeight"), Some(&Value::Int(400)));
    assert!(store.reset_to_default("origParent").is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn home_view_without_stored_config_is_errored() {
    let mut store = ConfigStore::new(host(View::Home, SERVE_TIME), MemoryPrefs::new());
    assert_eq!(store.init(&NoTheme).await.unwrap(), LifecycleState::Errored);
    assert_eq!(store.error().unwrap().kind(), ErrorKind::Config);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_write_keeps_the_previous_value() {
    let prefs = ReadOnlyPrefs::default();
    let locked = prefs.locked.clone();
    let mut store = config_store(prefs, SERVE_TIME).await;
    assert_eq!(store.state(), LifecycleState::Ready);
    let saved = store.prefs().get(CONFIG_KEY).unwrap();

    locked.store(true, Ordering::SeqCst);
    let err = store.save("padding", "4").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(err.cause(), "disk full");
    assert_eq!(store.value("padding"), Some(&Value::Int(0)));
    assert_eq!(store.to_wire_text(), saved);

    locked.store(false, Ordering::SeqCst);
    assert!(store.save("padding", "4").unwrap());
    assert_eq!(store.value("padding"), Some(&Value::Int(4)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn extreme_stored_serve_time_expires_deferred_cache() {
    let mut store = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    store.set("deferCache", Value::Bool(true)).unwrap();
    store.set("serveTime", Value::Int(i64::MIN)).unwrap();
    let blob = store.to_wire_text();

    let reopened = config_store(MemoryPrefs::with(CONFIG_KEY, &blob), i64::MAX).await;
    assert_eq!(reopened.state(), LifecycleState::Ready);
    assert_eq!(reopened.value("deferCache"), Some(&Value::Bool(false)));
    assert_eq!(reopened.value("serveTime"), Some(&Value::Int(i64::MAX)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn home_view_takes_system_parameters_from_the_host() {
    let editor = config_store(MemoryPrefs::new(), SERVE_TIME).await;
    let blob = editor.prefs().get(CONFIG_KEY).unwrap();

    let mut moved = host(View::Home, SERVE_TIME + 60_000);
    moved.parent = "https://example.org/elsewhere".into();
    let mut store = ConfigStore::new(moved, MemoryPrefs::with(CONFIG_KEY, &blob));
    assert_eq!(store.init(&NoTheme).await.unwrap(), LifecycleState::Ready);
    assert_eq!(
        store.value("parent"),
        Some(&Value::text("https://example.org/elsewhere"))
    );
    assert_eq!(store.value("serveTime"), Some(&Value::Int(SERVE_TIME + 60_000)));
    assert_eq!(store.value("origParent"), Some(&Value::text(PARENT)));
    assert_eq!(store.prefs().get(CONFIG_KEY).unwrap(), blob);
}
