// src/handlers/gophers.rs
// DOCUMENTATION: HTTP handlers for gopher operations
// PURPOSE: Parse requests, call the store, render pages

use crate::db::Storer;
use crate::errors::GopherError;
use crate::models::{ContentHash, Gopher, Rating};
use crate::views::{self, GopherCard, Pagination};
use actix_multipart::{Field, Multipart};
use actix_web::{http::header, web, HttpResponse};
use futures_util::{StreamExt, TryStreamExt};
use serde::Deserialize;
use validator::Validate;

/// Gophers shown per list page
pub const PAGE_SIZE: u32 = 200;

/// Largest accepted upload (20 MiB)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Name of the multipart field carrying the picture
pub const UPLOAD_FIELD: &str = "gopher";

/// Policy sent with raw pictures, disabling scripts and remote loads
pub const RAW_CONTENT_SECURITY_POLICY: &str =
    "sandbox; default-src 'none'; style-src 'unsafe-inline'";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Offset of the first gopher on the page
    pub start: Option<u32>,
}

/// Path of GET /rate/{hash}/{rating}
#[derive(Debug, Deserialize, Validate)]
pub struct RatePath {
    pub hash: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i64,
}

/// GET /
/// List a page of gophers with their average ratings
///
/// DOCUMENTATION: Per-gopher failures are shown on the page instead of
/// failing it, unless nothing on the page could be loaded
pub async fn list_gophers(
    store: web::Data<Storer>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, GopherError> {
    let start = query.start.unwrap_or(0);

    let hashes = store.list(start, PAGE_SIZE).await?;

    let mut cards = Vec::with_capacity(hashes.len());
    let mut errors = Vec::new();
    for hash in &hashes {
        match load_card(store.get_ref(), hash).await {
            Ok(Some(card)) => cards.push(card),
            Ok(None) => log::debug!("Gopher {} vanished while listing", hash),
            Err(e) => errors.push(format!("gopher {}: {}", hash, e)),
        }
    }

    if cards.is_empty() && !errors.is_empty() {
        log::error!("Every gopher on page starting at {} failed to load", start);
        return Err(GopherError::PersistenceError(errors.join("\n")));
    }

    let total = match store.count().await {
        Ok(total) => Some(total),
        Err(e) => {
            errors.push(format!("counting gophers: {}", e));
            None
        }
    };

    let pagination = Pagination {
        start,
        page_size: PAGE_SIZE,
        shown: cards.len(),
        total,
    };

    Ok(views::render(views::gophers_page(&cards, &errors, &pagination)))
}

async fn load_card(store: &Storer, hash: &ContentHash) -> Result<Option<GopherCard>, GopherError> {
    if store.load(hash).await?.is_none() {
        return Ok(None);
    }
    let rating = store.rating(hash).await?;
    Ok(Some(GopherCard {
        hash: *hash,
        rating,
    }))
}

/// GET /gopher/{hash}
/// Show a single gopher and links to rate it
pub async fn show_gopher(
    store: web::Data<Storer>,
    path: web::Path<String>,
) -> Result<HttpResponse, GopherError> {
    let hash: ContentHash = path.into_inner().parse()?;

    let gopher = find_gopher(store.get_ref(), &hash).await?;
    let rating = store.rating(&gopher.hash()).await?;

    Ok(views::render(views::gopher_page(&hash, rating)))
}

/// GET /raw/{hash}
/// Serve the stored picture bytes
pub async fn raw_gopher(
    store: web::Data<Storer>,
    path: web::Path<String>,
) -> Result<HttpResponse, GopherError> {
    let hash: ContentHash = path.into_inner().parse()?;

    let gopher = find_gopher(store.get_ref(), &hash).await?;
    let content_type = gopher.content_type();

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        // Uploads are untrusted: scripts inside an SVG must never run on our origin
        .insert_header((header::CONTENT_SECURITY_POLICY, RAW_CONTENT_SECURITY_POLICY))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((header::CONTENT_DISPOSITION, "inline"))
        // Content never changes for a given hash
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .insert_header((header::ETAG, format!("\"{}\"", hash)))
        .body(gopher.into_raw()))
}

async fn find_gopher(store: &Storer, hash: &ContentHash) -> Result<Gopher, GopherError> {
    store
        .load(hash)
        .await?
        .ok_or_else(|| GopherError::NotFound(format!("no such gopher {}", hash)))
}

/// GET /rate/{hash}/{rating}
/// Add a 1-5 star rating to a gopher
pub async fn rate_gopher(
    store: web::Data<Storer>,
    path: web::Path<RatePath>,
) -> Result<HttpResponse, GopherError> {
    let params = path.into_inner();
    if let Err(e) = params.validate() {
        return Err(GopherError::ValidationError(e.to_string()));
    }
    let rating = Rating::new(params.rating)?;
    let hash: ContentHash = params.hash.parse()?;

    store.rate(&hash, params.rating).await?;
    log::info!("Gopher {} rated {}", hash, rating);

    Ok(views::render(views::rated_page(&hash, rating)))
}

/// POST|PUT /upload
/// Store the picture sent in the multipart field "gopher"
pub async fn upload_gopher(
    store: web::Data<Storer>,
    mut payload: Multipart,
) -> Result<HttpResponse, GopherError> {
    let mut raw = None;

    while let Some(field) = payload
        .try_next()
        .await
        .map_err(|e| GopherError::ValidationError(format!("bad gopher data: {}", e)))?
    {
        if field.content_disposition().get_name() == Some(UPLOAD_FIELD) {
            raw = Some(read_image_field(field).await?);
            break;
        }
    }

    let raw = raw.ok_or_else(|| {
        GopherError::ValidationError(format!("missing {:?} file field", UPLOAD_FIELD))
    })?;

    let gopher = Gopher::new(raw);
    store.save(&gopher).await?;
    log::info!(
        "Saved gopher {} ({} bytes, {})",
        gopher.hash(),
        gopher.raw().len(),
        gopher.content_type()
    );

    Ok(views::render(views::saved_page(&gopher.hash())))
}

/// Read one file field fully, insisting on an image type and the size limit
async fn read_image_field(mut field: Field) -> Result<Vec<u8>, GopherError> {
    let is_image = field
        .content_type()
        .map(|mime| mime.type_().as_str() == "image")
        .unwrap_or(false);
    if !is_image {
        let got = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "none".to_string());
        return Err(GopherError::ValidationError(format!(
            "no image: content type is {}",
            got
        )));
    }

    let mut raw = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk
            .map_err(|e| GopherError::ValidationError(format!("couldn't read gopher: {}", e)))?;
        if raw.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(GopherError::ValidationError(format!(
                "gopher is larger than {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }
        raw.extend_from_slice(&chunk);
    }

    if raw.is_empty() {
        return Err(GopherError::ValidationError("empty gopher".to_string()));
    }
    Ok(raw)
}

/// Configuration for gopher routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| GopherError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| GopherError::ValidationError(err.to_string()).into()),
    )
    .route("/", web::get().to(list_gophers))
    .route("/gopher/{hash}", web::get().to(show_gopher))
    .route("/raw/{hash}", web::get().to(raw_gopher))
    .route("/rate/{hash}/{rating}", web::get().to(rate_gopher))
    .route("/upload", web::post().to(upload_gopher))
    .route("/upload", web::put().to(upload_gopher));
}
