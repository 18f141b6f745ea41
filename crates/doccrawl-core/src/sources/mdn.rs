//! MDN Web Animations API profile.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::{NoExpand, Regex};
use url::Url;

use super::SourceProfile;
use crate::cleaner::MdnCleaner;
use crate::links::UrlMapper;

/// Registry key of the MDN Web Animations API profile.
pub const MDN_PROFILE: &str = "mdn-web-animations-api";

#[allow(clippy::unwrap_used)]
static LANGUAGE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[a-z]{2}(-[A-Z]{2})?/").unwrap());

#[allow(clippy::unwrap_used)]
static MDN_LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"developer\.mozilla\.org/[a-z]{2}(-[A-Z]{2})?/").unwrap());

const API_ROOT: &str = "/docs/Web/API/";

const INCLUDE_PATTERNS: &[&str] = &[
    r"/docs/Web/API/Web_Animations_API($|/)",
    r"/docs/Web/API/Animation($|/)",
    r"/docs/Web/API/AnimationEffect($|/)",
    r"/docs/Web/API/AnimationEvent($|/)",
    r"/docs/Web/API/AnimationTimeline($|/)",
    r"/docs/Web/API/AnimationPlaybackEvent($|/)",
    r"/docs/Web/API/DocumentTimeline($|/)",
    r"/docs/Web/API/KeyframeEffect($|/)",
    r"/docs/Web/API/ScrollTimeline($|/)",
    r"/docs/Web/API/ViewTimeline($|/)",
    r"/docs/Web/API/Document/timeline$",
    r"/docs/Web/API/Document/getAnimations$",
    r"/docs/Web/API/Element/animate$",
    r"/docs/Web/API/Element/getAnimations$",
];

const SEED_PATHS: &[&str] = &[
    "/docs/Web/API/Web_Animations_API",
    "/docs/Web/API/Animation",
    "/docs/Web/API/KeyframeEffect",
    "/docs/Web/API/AnimationEffect",
    "/docs/Web/API/AnimationTimeline",
    "/docs/Web/API/DocumentTimeline",
    "/docs/Web/API/AnimationEvent",
    "/docs/Web/API/AnimationPlaybackEvent",
    "/docs/Web/API/ScrollTimeline",
    "/docs/Web/API/ViewTimeline",
];

/// Identifier to path, in match priority order.
const KNOWN_PAGES: &[(&str, &str)] = &[
    ("Web_Animations_API", "/docs/Web/API/Web_Animations_API"),
    (
        "guides/Using_the_Web_Animations_API",
        "/docs/Web/API/Web_Animations_API/Using_the_Web_Animations_API",
    ),
    (
        "guides/Web_Animations_API_Concepts",
        "/docs/Web/API/Web_Animations_API/Web_Animations_API_Concepts",
    ),
    ("guides/Keyframe_Formats", "/docs/Web/API/Web_Animations_API/Keyframe_Formats"),
    ("guides/Tips", "/docs/Web/API/Web_Animations_API/Tips"),
    ("interfaces/Animation/index", "/docs/Web/API/Animation"),
    ("interfaces/Animation/Animation", "/docs/Web/API/Animation/Animation"),
    ("interfaces/Animation/currentTime", "/docs/Web/API/Animation/currentTime"),
    ("interfaces/Animation/effect", "/docs/Web/API/Animation/effect"),
    ("interfaces/Animation/finished", "/docs/Web/API/Animation/finished"),
    ("interfaces/Animation/id", "/docs/Web/API/Animation/id"),
    ("interfaces/Animation/overallProgress", "/docs/Web/API/Animation/overallProgress"),
    ("interfaces/Animation/pending", "/docs/Web/API/Animation/pending"),
    ("interfaces/Animation/playbackRate", "/docs/Web/API/Animation/playbackRate"),
    ("interfaces/Animation/playState", "/docs/Web/API/Animation/playState"),
    ("interfaces/Animation/ready", "/docs/Web/API/Animation/ready"),
    ("interfaces/Animation/replaceState", "/docs/Web/API/Animation/replaceState"),
    ("interfaces/Animation/startTime", "/docs/Web/API/Animation/startTime"),
    ("interfaces/Animation/timeline", "/docs/Web/API/Animation/timeline"),
    ("interfaces/Animation/cancel", "/docs/Web/API/Animation/cancel"),
    ("interfaces/Animation/commitStyles", "/docs/Web/API/Animation/commitStyles"),
    ("interfaces/Animation/finish", "/docs/Web/API/Animation/finish"),
    ("interfaces/Animation/pause", "/docs/Web/API/Animation/pause"),
    ("interfaces/Animation/persist", "/docs/Web/API/Animation/persist"),
    ("interfaces/Animation/play", "/docs/Web/API/Animation/play"),
    ("interfaces/Animation/reverse", "/docs/Web/API/Animation/reverse"),
    ("interfaces/Animation/updatePlaybackRate", "/docs/Web/API/Animation/updatePlaybackRate"),
    ("interfaces/Animation/cancel_event", "/docs/Web/API/Animation/cancel_event"),
    ("interfaces/Animation/finish_event", "/docs/Web/API/Animation/finish_event"),
    ("interfaces/Animation/remove_event", "/docs/Web/API/Animation/remove_event"),
    ("interfaces/KeyframeEffect/index", "/docs/Web/API/KeyframeEffect"),
    ("interfaces/KeyframeEffect/KeyframeEffect", "/docs/Web/API/KeyframeEffect/KeyframeEffect"),
    ("interfaces/KeyframeEffect/target", "/docs/Web/API/KeyframeEffect/target"),
    ("interfaces/KeyframeEffect/pseudoElement", "/docs/Web/API/KeyframeEffect/pseudoElement"),
    (
        "interfaces/KeyframeEffect/iterationComposite",
        "/docs/Web/API/KeyframeEffect/iterationComposite",
    ),
    ("interfaces/KeyframeEffect/composite", "/docs/Web/API/KeyframeEffect/composite"),
    ("interfaces/KeyframeEffect/getKeyframes", "/docs/Web/API/KeyframeEffect/getKeyframes"),
    ("interfaces/KeyframeEffect/setKeyframes", "/docs/Web/API/KeyframeEffect/setKeyframes"),
    ("interfaces/AnimationEffect/index", "/docs/Web/API/AnimationEffect"),
    (
        "interfaces/AnimationEffect/getComputedTiming",
        "/docs/Web/API/AnimationEffect/getComputedTiming",
    ),
    ("interfaces/AnimationEffect/getTiming", "/docs/Web/API/AnimationEffect/getTiming"),
    ("interfaces/AnimationEffect/updateTiming", "/docs/Web/API/AnimationEffect/updateTiming"),
    ("interfaces/AnimationTimeline/index", "/docs/Web/API/AnimationTimeline"),
    ("interfaces/AnimationTimeline/currentTime", "/docs/Web/API/AnimationTimeline/currentTime"),
    ("interfaces/AnimationTimeline/duration", "/docs/Web/API/AnimationTimeline/duration"),
    ("interfaces/DocumentTimeline/index", "/docs/Web/API/DocumentTimeline"),
    (
        "interfaces/DocumentTimeline/DocumentTimeline",
        "/docs/Web/API/DocumentTimeline/DocumentTimeline",
    ),
    ("interfaces/AnimationEvent/index", "/docs/Web/API/AnimationEvent"),
    ("interfaces/AnimationEvent/AnimationEvent", "/docs/Web/API/AnimationEvent/AnimationEvent"),
    ("interfaces/AnimationEvent/animationName", "/docs/Web/API/AnimationEvent/animationName"),
    ("interfaces/AnimationEvent/elapsedTime", "/docs/Web/API/AnimationEvent/elapsedTime"),
    ("interfaces/AnimationEvent/pseudoElement", "/docs/Web/API/AnimationEvent/pseudoElement"),
    ("interfaces/AnimationPlaybackEvent/index", "/docs/Web/API/AnimationPlaybackEvent"),
    (
        "interfaces/AnimationPlaybackEvent/AnimationPlaybackEvent",
        "/docs/Web/API/AnimationPlaybackEvent/AnimationPlaybackEvent",
    ),
    (
        "interfaces/AnimationPlaybackEvent/currentTime",
        "/docs/Web/API/AnimationPlaybackEvent/currentTime",
    ),
    (
        "interfaces/AnimationPlaybackEvent/timelineTime",
        "/docs/Web/API/AnimationPlaybackEvent/timelineTime",
    ),
    ("interfaces/ScrollTimeline/index", "/docs/Web/API/ScrollTimeline"),
    ("interfaces/ScrollTimeline/ScrollTimeline", "/docs/Web/API/ScrollTimeline/ScrollTimeline"),
    ("interfaces/ScrollTimeline/source", "/docs/Web/API/ScrollTimeline/source"),
    ("interfaces/ScrollTimeline/axis", "/docs/Web/API/ScrollTimeline/axis"),
    ("interfaces/ViewTimeline/index", "/docs/Web/API/ViewTimeline"),
    ("interfaces/ViewTimeline/ViewTimeline", "/docs/Web/API/ViewTimeline/ViewTimeline"),
    ("interfaces/ViewTimeline/subject", "/docs/Web/API/ViewTimeline/subject"),
    ("interfaces/ViewTimeline/startOffset", "/docs/Web/API/ViewTimeline/startOffset"),
    ("interfaces/ViewTimeline/endOffset", "/docs/Web/API/ViewTimeline/endOffset"),
    ("extensions/Document.timeline", "/docs/Web/API/Document/timeline"),
    ("extensions/Document.getAnimations", "/docs/Web/API/Document/getAnimations"),
    ("extensions/Element.animate", "/docs/Web/API/Element/animate"),
    ("extensions/Element.getAnimations", "/docs/Web/API/Element/getAnimations"),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("main", "Overview"),
    ("guides", "Guides"),
    ("interfaces", "Interfaces"),
    ("extensions", "Document and Element Extensions"),
];

/// Maps MDN URLs onto the `guides/`, `interfaces/` and `extensions/` tree.
///
/// Known pages win. Any other API page falls back to
/// `interfaces/<Interface>/index` or `interfaces/<Interface>/<member>`.
///
/// ```rust
/// use doccrawl_core::links::UrlMapper;
/// use doccrawl_core::sources::MdnUrlMapper;
///
/// let mapper = MdnUrlMapper;
/// assert_eq!(
///     mapper.identifier_for_url("https://developer.mozilla.org/fr/docs/Web/API/Element/animate"),
///     Some("extensions/Element.animate".to_string())
/// );
/// assert_eq!(
///     mapper.identifier_for_url("https://developer.mozilla.org/en-US/docs/Web/API/CSSAnimation"),
///     Some("interfaces/CSSAnimation/index".to_string())
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MdnUrlMapper;

impl UrlMapper for MdnUrlMapper {
    fn identifier_for_url(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let path = LANGUAGE_PREFIX_RE.replace(parsed.path(), "/");

        if let Some((identifier, _)) = KNOWN_PAGES
            .iter()
            .find(|(_, known)| path == *known || path.ends_with(known))
        {
            return Some((*identifier).to_string());
        }

        let relative = path.replace(API_ROOT, "");
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            return None;
        }
        let parts: Vec<&str> = relative.split('/').collect();
        Some(match parts.as_slice() {
            [interface] => format!("interfaces/{interface}/index"),
            [interface, member] => format!("interfaces/{interface}/{member}"),
            _ => relative.to_string(),
        })
    }
}

/// Rewrite the language segment of an MDN URL to `language`.
///
/// ```rust
/// use doccrawl_core::sources::normalize_mdn_url;
///
/// assert_eq!(
///     normalize_mdn_url("https://developer.mozilla.org/de/docs/Web/API/Animation", "en-US"),
///     "https://developer.mozilla.org/en-US/docs/Web/API/Animation"
/// );
/// ```
pub fn normalize_mdn_url(url: &str, language: &str) -> String {
    let replacement = format!("developer.mozilla.org/{language}/");
    MDN_LANGUAGE_RE
        .replace(url, NoExpand(&replacement))
        .into_owned()
}

pub(super) fn profile() -> SourceProfile {
    let to_strings = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();

    SourceProfile {
        name: MDN_PROFILE.to_string(),
        include_patterns: to_strings(INCLUDE_PATTERNS),
        seed_paths: to_strings(SEED_PATHS),
        known_pages: KNOWN_PAGES
            .iter()
            .map(|(id, path)| ((*id).to_string(), (*path).to_string()))
            .collect(),
        language_prefixed: true,
        category_order: CATEGORIES.iter().map(|(key, _)| (*key).to_string()).collect(),
        category_titles: CATEGORIES
            .iter()
            .map(|(key, title)| ((*key).to_string(), (*title).to_string()))
            .collect::<BTreeMap<_, _>>(),
        cleaner: Arc::new(MdnCleaner::default()),
        mapper: Arc::new(MdnUrlMapper),
        normalizer: Some(Arc::new(normalize_mdn_url)),
    }
}
