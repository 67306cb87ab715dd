#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use understudy::DoubleRegistry;
use understudy::test_tools::TestLogger;

/// List operations doubled in the integration tests.
pub trait ListApi {
    fn add(&self, element: String) -> bool;
    fn get(&self, index: usize) -> Option<String>;
    fn size(&self) -> usize;
    fn clear(&self);
}

understudy::double! {
    /// Double of [ListApi]
    pub struct ListDouble for ListApi {
        fn add(&self, element: String) -> bool;
        fn get(&self, index: usize) -> Option<String>;
        fn size(&self) -> usize;
        fn clear(&self);
    }
}

/// Real list, spied on by the tests.
#[derive(Default)]
pub struct VecList {
    elements: Mutex<Vec<String>>,
}

impl ListApi for VecList {
    fn add(&self, element: String) -> bool {
        self.elements.lock().unwrap().push(element);
        true
    }

    fn get(&self, index: usize) -> Option<String> {
        self.elements.lock().unwrap().get(index).cloned()
    }

    fn size(&self) -> usize {
        self.elements.lock().unwrap().len()
    }

    fn clear(&self) {
        self.elements.lock().unwrap().clear();
    }
}

/// Unit under test: keeps the titles of a playlist in an injected list.
pub struct Playlist {
    titles: Arc<dyn ListApi + Send + Sync>,
}

impl Playlist {
    pub fn new(titles: Arc<dyn ListApi + Send + Sync>) -> Self {
        Self { titles }
    }

    pub fn enqueue(&self, title: &str) -> bool {
        self.titles.add(title.to_string())
    }

    pub fn now_playing(&self) -> String {
        self.titles
            .get(0)
            .unwrap_or_else(|| "nothing".to_string())
    }

    pub fn restart(&self) {
        if self.titles.size() > 0 {
            self.titles.clear();
        }
    }
}

pub fn registry() -> DoubleRegistry {
    DoubleRegistry::new(&TestLogger::stdout())
}

/// Run the call, returning the message it raised, if any.
pub fn raised_message<T>(call: impl FnOnce() -> T) -> Option<String> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(call)) {
        Ok(_) => None,
        Err(payload) => payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string())),
    }
}
