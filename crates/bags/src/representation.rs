//! Serialize tiddlers for the negotiated media type

use std::collections::BTreeMap;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::model::Tiddler;

const TEXT_PLAIN: &str = "text/plain; charset=UTF-8";
const TEXT_HTML: &str = "text/html; charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";

/// List entry: everything but the text
#[derive(Serialize)]
struct TiddlerSummary<'a> {
    title: &'a str,
    bag: &'a str,
    fields: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a Tiddler> for TiddlerSummary<'a> {
    fn from(tiddler: &'a Tiddler) -> Self {
        Self {
            title: &tiddler.title,
            bag: &tiddler.bag,
            fields: &tiddler.fields,
        }
    }
}

pub fn tiddler(tiddler: &Tiddler, media_type: &str) -> Response {
    match media_type {
        "text/plain" => ([(header::CONTENT_TYPE, TEXT_PLAIN)], tiddler.text.clone()).into_response(),
        "application/json" => json(tiddler),
        _ => {
            let title = escape_html(&tiddler.title);
            let body = format!(
                "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
                 <body><h1>{title}</h1><pre>{}</pre></body></html>\n",
                escape_html(&tiddler.text),
            );
            ([(header::CONTENT_TYPE, TEXT_HTML)], body).into_response()
        }
    }
}

pub fn tiddler_list(bag: &str, tiddlers: &[Tiddler], media_type: &str) -> Response {
    match media_type {
        "text/plain" => {
            let body: String = tiddlers
                .iter()
                .map(|t| format!("{}\n", t.title))
                .collect();
            ([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
        }
        "application/json" => {
            let summaries: Vec<TiddlerSummary> = tiddlers.iter().map(TiddlerSummary::from).collect();
            json(&summaries)
        }
        _ => {
            let items: String = tiddlers
                .iter()
                .map(|t| format!("<li>{}</li>", escape_html(&t.title)))
                .collect();
            let body = format!(
                "<!DOCTYPE html>\n<html><head><title>Tiddlers in {bag}</title></head>\
                 <body><ul>{items}</ul></body></html>\n",
                bag = escape_html(bag),
            );
            ([(header::CONTENT_TYPE, TEXT_HTML)], body).into_response()
        }
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => ([(header::CONTENT_TYPE, APPLICATION_JSON)], body).into_response(),
        Err(e) => {
            tracing::error!("failed to serialize tiddlers: {}", e);
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
