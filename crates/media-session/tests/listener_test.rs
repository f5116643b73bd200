use nowtoast_core::{ToastConfig, TrackChangeDetector, TrackSnapshot};
use nowtoast_media_session::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Plays through a fixed playlist, one entry per poll, then repeats the last
struct Playlist {
    entries: Vec<Option<TrackSnapshot>>,
    position: AtomicUsize,
}

impl TrackFetcher for Playlist {
    fn name(&self) -> &'static str {
        "playlist"
    }

    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
        let i = self.position.fetch_add(1, Ordering::SeqCst).min(self.entries.len() - 1);
        self.entries[i].clone().ok_or(FetchError::MissingTitle)
    }
}

fn song(title: &str) -> Option<TrackSnapshot> {
    TrackSnapshot::playing(None, title, "The Band", "The Album")
}

#[test]
fn test_consumer_sees_each_track_once() {
    let playlist = Playlist {
        entries: vec![song("One"), song("One"), None, song("Two"), None, song("Two")],
        position: AtomicUsize::new(0),
    };
    let listener = MediaListener::new(Box::new(playlist), Duration::from_millis(5));
    let reader = listener.reader();
    let mut detector = TrackChangeDetector::new(ToastConfig::default());
    let mut announced = Vec::new();

    listener.start().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while announced.len() < 2 && Instant::now() < deadline {
        let snapshot = reader.current_snapshot();
        if let Some(toast) = detector.observe(snapshot.as_deref(), false) {
            announced.push(toast.title);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    listener.shutdown();

    assert_eq!(announced, vec!["One", "Two"]);
    assert_eq!(reader.current_snapshot().unwrap().title(), "Two");
}

#[test]
fn test_reader_outlives_listener() {
    let calls = Arc::new(AtomicUsize::new(0));

    struct Counting(Arc<AtomicUsize>);
    impl TrackFetcher for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(TrackSnapshot::nothing_playing())
        }
    }

    let listener = MediaListener::new(Box::new(Counting(Arc::clone(&calls))), Duration::from_millis(5));
    let reader = listener.reader();
    listener.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while reader.current_snapshot().is_none() {
        assert!(Instant::now() < deadline, "no snapshot published");
        std::thread::sleep(Duration::from_millis(1));
    }
    drop(listener);

    let snapshot = reader.current_snapshot().unwrap();
    assert!(!snapshot.is_playing());
    assert_eq!(snapshot.title(), "");
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_missing_helper_program() {
    struct Silent;
    impl CommandRunner for Silent {
        fn run(&self, program: &str, _args: &[&str]) -> Result<Vec<String>, CommandError> {
            Err(CommandError::Launch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    // Without playerctl or dbus-send no MPRIS player is reachable; the
    // scripting bridges have no such answer and fail the poll instead
    let config = nowtoast_core::ListenerConfig::default();
    for backend in [Backend::Playerctl, Backend::DbusSend] {
        let fetcher = create_fetcher_for(backend, &config, Arc::new(Silent));
        assert_eq!(fetcher.fetch_current_track().unwrap(), TrackSnapshot::nothing_playing(), "{:?}", backend);
    }
    for backend in [Backend::PowerShell, Backend::AppleScript] {
        let fetcher = create_fetcher_for(backend, &config, Arc::new(Silent));
        assert!(fetcher.fetch_current_track().is_err(), "{:?}", backend);
    }
}
