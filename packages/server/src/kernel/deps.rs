//! Server dependencies (using traits for testability)
//!
//! Handles are constructed explicitly at startup and passed to every
//! component; nothing is held in process-wide globals.

use std::sync::Arc;

use crate::domains::reviews::{ContentClassifier, ReviewRepository};
use crate::kernel::{BaseNotifier, BaseWorkQueue};

/// Dependencies shared by the HTTP layer and the pipeline consumers.
#[derive(Clone)]
pub struct ServerDeps {
    pub reviews: Arc<dyn ReviewRepository>,
    /// Queue handle used for pushes from request handlers.
    pub queue: Arc<dyn BaseWorkQueue>,
    pub classifier: Arc<dyn ContentClassifier>,
    pub notifier: Arc<dyn BaseNotifier>,
}

impl ServerDeps {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        queue: Arc<dyn BaseWorkQueue>,
        classifier: Arc<dyn ContentClassifier>,
        notifier: Arc<dyn BaseNotifier>,
    ) -> Self {
        Self {
            reviews,
            queue,
            classifier,
            notifier,
        }
    }
}
