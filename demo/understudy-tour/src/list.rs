use std::collections::LinkedList;
use std::sync::{Arc, Mutex, PoisonError};

/// The list interface doubled along the tour.
pub trait ListApi {
    /// Append an element, returns true if the list changed.
    fn add(&self, element: String) -> bool;

    /// Element at the given position.
    fn get(&self, index: usize) -> Option<String>;

    /// Number of elements.
    fn size(&self) -> usize;

    /// Remove every element.
    fn clear(&self);
}

understudy::double! {
    /// Double of [ListApi].
    pub struct ListDouble for ListApi {
        fn add(&self, element: String) -> bool;
        fn get(&self, index: usize) -> Option<String>;
        fn size(&self) -> usize;
        fn clear(&self);
    }
}

/// Real [ListApi] backed by a linked list.
#[derive(Default)]
pub struct SharedLinkedList {
    elements: Mutex<LinkedList<String>>,
}

impl SharedLinkedList {
    fn elements(&self) -> std::sync::MutexGuard<'_, LinkedList<String>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ListApi for SharedLinkedList {
    fn add(&self, element: String) -> bool {
        self.elements().push_back(element);
        true
    }

    fn get(&self, index: usize) -> Option<String> {
        self.elements().iter().nth(index).cloned()
    }

    fn size(&self) -> usize {
        self.elements().len()
    }

    fn clear(&self) {
        self.elements().clear();
    }
}

/// A unit under test receiving its list by injection.
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

    pub fn now_playing(&self) -> Option<String> {
        self.titles.get(0)
    }

    pub fn restart(&self) {
        if self.titles.size() > 0 {
            self.titles.clear();
        }
    }
}
