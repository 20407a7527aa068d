use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Ordered image sources, optionally gated by an activation predicate.
#[derive(Clone)]
pub struct ImageSet {
    pub images: Vec<String>,
    predicate: Option<Predicate>,
}

impl ImageSet {
    pub fn new<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: images.into_iter().map(Into::into).collect(),
            predicate: None,
        }
    }

    /// Activate this set only while `predicate` holds.
    pub fn when(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets without a predicate always match.
    pub fn matches(&self) -> bool {
        self.predicate.as_ref().is_none_or(|p| p())
    }
}

impl fmt::Debug for ImageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSet")
            .field("images", &self.images.len())
            .field("conditional", &self.predicate.is_some())
            .finish()
    }
}

/// First matching set in declaration order.
pub(crate) fn select_active(sets: &[ImageSet]) -> Option<usize> {
    sets.iter().position(ImageSet::matches)
}

/// `{ "images": [...] }` entries, for option files and the CLI.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImageSetSpec {
    pub images: Vec<String>,
}

impl From<ImageSetSpec> for ImageSet {
    fn from(spec: ImageSetSpec) -> Self {
        Self::new(spec.images)
    }
}
