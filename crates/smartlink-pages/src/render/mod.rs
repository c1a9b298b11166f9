//! Static page rendering for SmartLinks.
//!
//! A page carries the Open Graph / Twitter Card tags crawlers need for link
//! previews and sends human visitors on to the single-page app after a short
//! delay (with a `<noscript>` refresh and a visible link as fallbacks).
//!
//! Rendering is pure: the same record and config always produce the same
//! bytes. Nothing time-dependent goes into the document.

pub mod components;

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::config::Config;
use crate::error::ValidationError;
use crate::record::SmartLinkRecord;
use crate::store::page_url;
use components::{
    Escaped, OpenGraphData, PAGE_CSS, is_safe_url, redirect_script, social_meta, truncate,
};

/// Maximum description length in meta tags.
const DESCRIPTION_MAX_LEN: usize = 200;

/// Render a SmartLink record into a complete HTML document.
///
/// Fails without producing anything if a required field is missing.
pub fn render_page(record: &SmartLinkRecord, config: &Config) -> Result<Markup, ValidationError> {
    record.validate()?;

    let track = record.track_title.trim();
    let artist = record.artist_name.trim();
    let cover = record.cover_image_url.trim();
    let title = format!("{track} - {artist}");
    let description = truncate(&record.description_or_default(), DESCRIPTION_MAX_LEN);
    let canonical = page_url(&config.base_url, &record.short_id);
    let target = record.app_route();

    let og = OpenGraphData {
        title: &title,
        description: &description,
        og_type: "music.song",
        image: cover,
        url: &canonical,
        site_name: &config.site_name,
        twitter_card_type: "summary_large_image",
    };

    let links = record
        .platform_links
        .iter()
        .filter(|l| is_safe_url(&l.url) && !l.platform.trim().is_empty());

    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (Escaped(&title)) }
                meta name="description" content=(Escaped(&description));
                link rel="canonical" href=(Escaped(&canonical));

                (social_meta(&og))

                noscript {
                    meta http-equiv="refresh" content={ "0;url=" (target) };
                }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main {
                    @if is_safe_url(cover) {
                        img class="cover" src=(Escaped(cover)) alt=(Escaped(&title));
                    }
                    h1 class="track" { (Escaped(track)) }
                    p class="artist" { (Escaped(artist)) }

                    ul class="platforms" {
                        @for link in links {
                            li {
                                a href=(Escaped(&link.url)) rel="noopener" {
                                    (Escaped(link.platform.trim()))
                                }
                            }
                        }
                    }

                    p class="redirect" {
                        "Opening SmartLink… "
                        a href=(target) { "Continue" }
                    }
                }
                (redirect_script(&target, config.redirect_delay_ms))
            }
        }
    })
}
