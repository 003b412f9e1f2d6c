// src/views.rs
// DOCUMENTATION: HTML pages, compiled in with maud
// PURPOSE: Turn handler results into markup; interpolation is auto-escaped

use crate::models::{ContentHash, Rating};
use actix_web::{http::StatusCode, HttpResponse};
use maud::{html, Markup, DOCTYPE};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// One gopher on the list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherCard {
    pub hash: ContentHash,
    pub rating: Rating,
}

/// Where the list page sits within all gophers
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub start: u32,
    pub page_size: u32,
    pub shown: usize,
    /// None when counting failed
    pub total: Option<i64>,
}

impl Pagination {
    pub fn previous(&self) -> Option<u32> {
        (self.start > 0).then(|| self.start.saturating_sub(self.page_size))
    }

    pub fn next(&self) -> Option<u32> {
        let end = u64::from(self.start) + self.shown as u64;
        let more = match self.total {
            Some(total) => (end as i64) < total,
            None => self.shown as u64 >= u64::from(self.page_size),
        };
        if more && self.shown > 0 {
            u32::try_from(end).ok()
        } else {
            None
        }
    }
}

/// 200 response carrying a rendered page
pub fn render(markup: Markup) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(HTML_CONTENT_TYPE)
        .body(markup.into_string())
}

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Gopher Rating" }
            }
            body {
                header {
                    a href="/" { "Gopher Rating" }
                }
                main { (content) }
            }
        }
    }
}

fn stars(rating: Rating) -> Markup {
    html! {
        @if rating.is_rated() {
            span class="rating" title=(format!("{} of {}", rating, Rating::MAX_STARS)) {
                @for _ in 0..rating.stars() { "★" }
                @for _ in rating.stars()..Rating::MAX_STARS { "☆" }
            }
        } @else {
            span class="rating unrated" { "not rated yet" }
        }
    }
}

fn upload_form() -> Markup {
    html! {
        form method="post" action="/upload" enctype="multipart/form-data" {
            label {
                "Upload a gopher: "
                input type="file" name="gopher" accept="image/*" required;
            }
            button type="submit" { "Upload" }
        }
    }
}

/// List of gophers with upload form
pub fn gophers_page(cards: &[GopherCard], errors: &[String], pagination: &Pagination) -> Markup {
    layout(
        "Gophers",
        html! {
            h1 { "Gophers" }
            (upload_form())
            @if !errors.is_empty() {
                ul class="errors" {
                    @for error in errors { li { (error) } }
                }
            }
            @if let Some(total) = pagination.total {
                p class="summary" {
                    @if cards.is_empty() {
                        "No gophers here (" (total) " in total)."
                    } @else {
                        "Showing " (pagination.start + 1) "–"
                        (u64::from(pagination.start) + cards.len() as u64)
                        " of " (total) "."
                    }
                }
            }
            ul class="gophers" {
                @for card in cards {
                    li {
                        a href=(format!("/gopher/{}", card.hash)) {
                            img src=(format!("/raw/{}", card.hash)) alt="a gopher" loading="lazy";
                        }
                        (stars(card.rating))
                    }
                }
            }
            nav class="pages" {
                @if let Some(previous) = pagination.previous() {
                    a href=(format!("/?start={}", previous)) rel="prev" { "← previous" }
                }
                @if let Some(next) = pagination.next() {
                    a href=(format!("/?start={}", next)) rel="next" { "next →" }
                }
            }
        },
    )
}

/// Single gopher with its rating and links to rate it
pub fn gopher_page(hash: &ContentHash, rating: Rating) -> Markup {
    layout(
        "Gopher",
        html! {
            figure {
                img src=(format!("/raw/{}", hash)) alt="a gopher";
                figcaption { code { (hash.to_hex()) } }
            }
            p { "Average rating: " (stars(rating)) }
            p class="rate" {
                "Rate it: "
                @for value in Rating::SCALE {
                    a href=(format!("/rate/{}/{}", hash, value)) { (value.stars()) "★" } " "
                }
            }
        },
    )
}

pub fn rated_page(hash: &ContentHash, rating: Rating) -> Markup {
    layout(
        "Rated",
        html! {
            h1 { "Thanks for rating!" }
            p {
                "You gave " (stars(rating)) " to "
                a href=(format!("/gopher/{}", hash)) { "this gopher" } "."
            }
        },
    )
}

pub fn saved_page(hash: &ContentHash) -> Markup {
    layout(
        "Saved",
        html! {
            h1 { "Gopher saved" }
            p {
                a href=(format!("/gopher/{}", hash)) { "Look at your gopher" }
                " or go back to "
                a href="/" { "all gophers" } "."
            }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    layout(
        status.canonical_reason().unwrap_or("Error"),
        html! {
            h1 { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
            pre { (message) }
        },
    )
}
