//! Folder listing
//!
//! Pages through the delimiter-grouped listing endpoint and folds the pages
//! into the flat `{files, folders}` model a file browser renders.

use std::sync::Arc;

use futures::{Stream, TryStreamExt, future, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::SelectionContext;
use crate::error::{Error, Result};
use crate::key::{self, Key};
use crate::path::{DELIMITER, extension, folder_name};
use crate::preview::{ExtensionClassifier, PreviewClassifier, PreviewDescriptor};
use crate::traits::{BucketApi, ListPage, ListRequest, ObjectRecord};

/// Upper bound on pages fetched by a single listing call
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// A file in the current folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    /// The underlying object record
    #[serde(flatten)]
    pub object: ObjectRecord,

    /// Key with the effective prefix stripped
    pub name: String,

    /// Folder the listing was taken from
    pub path: String,

    /// Text after the last `.`, empty if none
    pub extension: String,

    pub preview: Option<PreviewDescriptor>,

    pub is_file: bool,

    /// Encoded name, used as the item identity
    pub hash: Key,
}

/// A virtual subfolder of the current folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub name: String,

    /// Folder the listing was taken from
    pub path: String,

    /// Raw delimited prefix
    pub key: String,

    pub is_folder: bool,

    /// Encoded full prefix, used as the item identity
    pub hash: Key,
}

/// Result of a listing call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub files: Vec<FileItem>,
    pub folders: Vec<FolderItem>,
}

enum PageCursor {
    Start,
    Next(String),
    Done,
}

struct PageState {
    cursor: PageCursor,
    fetched: usize,
}

/// Drives the listing endpoint for one folder at a time
pub struct ListingAggregator<A: ?Sized> {
    api: Arc<A>,
    classifier: Arc<dyn PreviewClassifier>,
    max_pages: usize,
}

impl<A: BucketApi + ?Sized> ListingAggregator<A> {
    /// Create an aggregator using the extension-based preview classifier
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            classifier: Arc::new(ExtensionClassifier),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn PreviewClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Lazy sequence of raw pages under an encoded prefix
    ///
    /// Ends when the server stops reporting truncation, omits the cursor, or
    /// hands back the cursor it was just given. Yields a server error once
    /// the page bound is exceeded.
    pub fn pages<'a>(
        &'a self,
        bucket: &'a str,
        prefix: Key,
    ) -> impl Stream<Item = Result<ListPage>> + 'a {
        let api = &*self.api;
        let max_pages = self.max_pages;

        stream::try_unfold(
            PageState {
                cursor: PageCursor::Start,
                fetched: 0,
            },
            move |state| {
                let prefix = prefix.clone();
                async move {
                    let sent = match state.cursor {
                        PageCursor::Done => return Ok(None),
                        PageCursor::Start => None,
                        PageCursor::Next(cursor) => Some(cursor),
                    };

                    if state.fetched >= max_pages {
                        return Err(Error::Server(format!(
                            "Listing did not finish after {max_pages} pages"
                        )));
                    }

                    let page = api
                        .list_page(
                            bucket,
                            ListRequest {
                                prefix,
                                cursor: sent.clone(),
                            },
                        )
                        .await?;

                    debug!(
                        page = state.fetched + 1,
                        objects = page.objects.len(),
                        prefixes = page.delimited_prefixes.len(),
                        truncated = page.truncated,
                        "Fetched listing page"
                    );

                    let cursor = match (page.truncated, &page.cursor) {
                        (false, _) | (true, None) => PageCursor::Done,
                        (true, Some(next)) if sent.as_ref() == Some(next) => {
                            warn!(cursor = %next, "Listing cursor did not advance, stopping");
                            PageCursor::Done
                        }
                        (true, Some(next)) => PageCursor::Next(next.clone()),
                    };

                    Ok(Some((
                        page,
                        PageState {
                            cursor,
                            fetched: state.fetched + 1,
                        },
                    )))
                }
            },
        )
    }

    /// List the current folder of `ctx`
    ///
    /// Folders come back in arrival order; files come back in the reverse of
    /// arrival order, so the last page's files are first. A failed page fails
    /// the whole call.
    pub async fn list(&self, ctx: &SelectionContext) -> Result<Listing> {
        let prefix = ctx.effective_folder();
        let encoded = key::encode_str(&prefix);

        let mut listing = self
            .pages(&ctx.bucket, encoded)
            .try_fold(Listing::default(), |mut acc, page| {
                let page = partition_page(page, ctx, &prefix, self.classifier.as_ref());
                acc.files.extend(page.files);
                acc.folders.extend(page.folders);
                future::ready(Ok(acc))
            })
            .await?;

        listing.files.reverse();
        Ok(listing)
    }
}

/// Split one raw page into visible files and folders, in arrival order
pub fn partition_page(
    page: ListPage,
    ctx: &SelectionContext,
    prefix: &str,
    classifier: &dyn PreviewClassifier,
) -> Listing {
    let files = page
        .objects
        .into_iter()
        // Keys ending in the delimiter are folder placeholders
        .filter(|object| !object.key.ends_with(DELIMITER))
        .map(|object| file_item(object, ctx, prefix, classifier))
        .filter(|file| ctx.is_visible(&file.name))
        .collect();

    let folders = page
        .delimited_prefixes
        .into_iter()
        .map(|delimited| folder_item(delimited, ctx))
        .filter(|folder| ctx.is_visible(&folder.name))
        .collect();

    Listing { files, folders }
}

// Files are identified by their encoded name and folders by their encoded
// full prefix. The asymmetry is observable through `hash` and must stay.

fn file_item(
    object: ObjectRecord,
    ctx: &SelectionContext,
    prefix: &str,
    classifier: &dyn PreviewClassifier,
) -> FileItem {
    let name = object
        .key
        .strip_prefix(prefix)
        .unwrap_or(&object.key)
        .to_string();

    FileItem {
        extension: extension(&name).to_string(),
        preview: classifier.classify(&name),
        hash: key::encode_str(&name),
        path: ctx.current_folder.clone(),
        is_file: true,
        name,
        object,
    }
}

fn folder_item(prefix: String, ctx: &SelectionContext) -> FolderItem {
    FolderItem {
        name: folder_name(&prefix).to_string(),
        path: ctx.current_folder.clone(),
        hash: key::encode_str(&prefix),
        is_folder: true,
        key: prefix,
    }
}
