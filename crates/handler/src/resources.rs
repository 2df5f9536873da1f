//! External resources, fetched asynchronously and memoized per URI.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use log::{debug, warn};

pub type LocalFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub uri: String,
    pub bytes: Vec<u8>,
    pub width: f64,
    pub height: f64,
    /// Stands in for an image that could not be loaded.
    pub placeholder: bool,
}

impl Image {
    /// Wraps fetched bytes, reading the size from a PNG header when
    /// there is one.
    pub fn decode(uri: &str, bytes: Vec<u8>) -> Self {
        let (width, height) = png_size(&bytes).unwrap_or((0.0, 0.0));
        Self {
            uri: uri.to_string(),
            bytes,
            width,
            height,
            placeholder: false,
        }
    }

    pub fn placeholder(uri: &str, size: [f64; 2]) -> Self {
        Self {
            uri: uri.to_string(),
            bytes: Vec::new(),
            width: size[0],
            height: size[1],
            placeholder: true,
        }
    }
}

fn png_size(bytes: &[u8]) -> Option<(f64, f64)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width as f64, height as f64))
}

#[derive(Debug)]
pub enum FetchError {
    Io { uri: String, source: std::io::Error },
    Offline { uri: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Io { uri, source } => write!(f, "failed to read {}: {}", uri, source),
            FetchError::Offline { uri } => write!(f, "no fetcher available for {}", uri),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io { source, .. } => Some(source),
            FetchError::Offline { .. } => None,
        }
    }
}

/// Source of resource bytes.
pub trait Fetch {
    fn fetch<'a>(&'a self, uri: &'a str) -> LocalFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Reads local paths and `file://` URIs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch<'a>(&'a self, uri: &'a str) -> LocalFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let path = uri.strip_prefix("file://").unwrap_or(uri);
            smol::fs::read(path).await.map_err(|source| FetchError::Io {
                uri: uri.to_string(),
                source,
            })
        })
    }
}

/// Fails every fetch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Fetch for Offline {
    fn fetch<'a>(&'a self, uri: &'a str) -> LocalFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            Err(FetchError::Offline {
                uri: uri.to_string(),
            })
        })
    }
}

/// Memoizes loaded images by URI for the cache's lifetime. Nothing is
/// evicted; a failed fetch is remembered as its placeholder.
pub struct ResourceCache {
    fetcher: Box<dyn Fetch>,
    images: RefCell<HashMap<String, Rc<Image>>>,
    placeholder: [f64; 2],
}

impl ResourceCache {
    pub fn new(fetcher: impl Fetch + 'static, placeholder: [f64; 2]) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            images: RefCell::new(HashMap::new()),
            placeholder,
        }
    }

    pub fn offline() -> Self {
        Self::new(Offline, [16.0, 16.0])
    }

    pub fn cached(&self, uri: &str) -> Option<Rc<Image>> {
        self.images.borrow().get(uri).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }

    /// The image at `uri`, fetched on first request. Never fails.
    pub async fn load(&self, uri: &str) -> Rc<Image> {
        if let Some(image) = self.cached(uri) {
            debug!("resource cache hit: {}", uri);
            return image;
        }
        let image = match self.fetcher.fetch(uri).await {
            Ok(bytes) => Image::decode(uri, bytes),
            Err(err) => {
                warn!("{}; using placeholder", err);
                Image::placeholder(uri, self.placeholder)
            }
        };
        let image = Rc::new(image);
        self.images
            .borrow_mut()
            .insert(uri.to_string(), Rc::clone(&image));
        image
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("images", &self.images.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        calls: Rc<Cell<usize>>,
    }

    impl Fetch for Counting {
        fn fetch<'a>(&'a self, uri: &'a str) -> LocalFuture<'a, Result<Vec<u8>, FetchError>> {
            self.calls.set(self.calls.get() + 1);
            Box::pin(async move {
                if uri.ends_with(".png") {
                    let mut bytes = PNG_SIGNATURE.to_vec();
                    bytes.extend_from_slice(&[0, 0, 0, 13]);
                    bytes.extend_from_slice(b"IHDR");
                    bytes.extend_from_slice(&640u32.to_be_bytes());
                    bytes.extend_from_slice(&480u32.to_be_bytes());
                    Ok(bytes)
                } else {
                    Err(FetchError::Offline {
                        uri: uri.to_string(),
                    })
                }
            })
        }
    }

    #[test]
    fn test_loads_once_per_uri() {
        let calls = Rc::new(Cell::new(0));
        let cache = ResourceCache::new(
            Counting {
                calls: Rc::clone(&calls),
            },
            [8.0, 8.0],
        );
        smol::block_on(async {
            let first = cache.load("a.png").await;
            let second = cache.load("a.png").await;
            assert!(Rc::ptr_eq(&first, &second));
            assert_eq!((first.width, first.height), (640.0, 480.0));
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failure_becomes_placeholder() {
        let calls = Rc::new(Cell::new(0));
        let cache = ResourceCache::new(
            Counting {
                calls: Rc::clone(&calls),
            },
            [8.0, 8.0],
        );
        smol::block_on(async {
            let image = cache.load("missing.jpg").await;
            assert!(image.placeholder);
            assert_eq!(image.width, 8.0);
            cache.load("missing.jpg").await;
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unknown_format_has_no_size() {
        let image = Image::decode("x.bin", vec![1, 2, 3]);
        assert_eq!((image.width, image.height), (0.0, 0.0));
        assert!(!image.placeholder);
    }
}
