//! Where each scraped venue keeps its repertoire and how to read it.

use crate::domain::venue::Venue;

/// How the showing date and time are pieced together for one root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// Text of one descendant.
    Text { selector: &'static str },
    /// Last `lines` lines of a descendant's text.
    TrailingLines { selector: &'static str, lines: usize },
    /// Date in an attribute of the root element, time in a descendant.
    AttrWithText {
        attr: &'static str,
        time: &'static str,
    },
    /// Date printed once per group in a separator element; rows without
    /// one reuse the last date seen on the page.
    CarriedDate {
        date: &'static str,
        time: &'static str,
    },
    /// Date passed as the `from_end`-th last comma separated argument of a
    /// script handler, time in the same element's text. Showings whose
    /// element has no handler are skipped.
    HandlerArgument {
        selector: &'static str,
        attr: &'static str,
        from_end: usize,
    },
    /// Date and time in positional children of a container.
    Spans {
        container: &'static str,
        item: &'static str,
        date_index: usize,
        time_index: usize,
    },
}

/// Booking link attribute, resolved against the site origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRule {
    pub selector: &'static str,
    pub attr: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlRules {
    pub venue: Venue,
    pub origin: &'static str,
    /// Repertoire page, relative to the origin.
    pub start_path: &'static str,
    /// One showing per match.
    pub root: &'static str,
    pub title: &'static str,
    /// Use only the first title match instead of all of them.
    pub title_first: bool,
    pub date: DateRule,
    pub link: Option<LinkRule>,
    /// Links to further repertoire pages.
    pub next_page: Option<&'static str>,
    /// Used when the page does not declare its encoding.
    pub charset: Option<&'static str>,
    pub skip_past: bool,
}

const fn href(selector: &'static str) -> Option<LinkRule> {
    Some(LinkRule {
        selector,
        attr: "href",
    })
}

pub const HTML_VENUES: [HtmlRules; 7] = [
    HtmlRules {
        venue: Venue::Agrafka,
        origin: "https://bilety.kinoagrafka.pl",
        start_path: "/",
        root: "div.repertoire-once",
        title: "a",
        title_first: true,
        date: DateRule::TrailingLines {
            selector: "div.date",
            lines: 2,
        },
        link: href("a.button"),
        next_page: None,
        charset: None,
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::Kijow,
        origin: "https://kupbilet.kijow.pl",
        start_path: "/MSI/mvc/pl?sort=Date&date=1970-01&datestart=0",
        root: "div.cd-timeline-block",
        title: "h2",
        title_first: false,
        date: DateRule::Text {
            selector: "span.cd-date",
        },
        link: href("a.btn-badge2"),
        next_page: Some("a[href].eventcard.col-6"),
        charset: None,
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::Kika,
        origin: "https://bilety.kinokika.pl",
        start_path: "/",
        root: "div.repertoire-once",
        title: "a",
        title_first: true,
        date: DateRule::TrailingLines {
            selector: "div.date",
            lines: 2,
        },
        link: href("a.button"),
        next_page: None,
        charset: None,
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::Mikro,
        origin: "https://kinomikro.pl",
        start_path: "/repertoire/?view=all",
        root: "section.row",
        title: "a.repertoire-item-title",
        title_first: false,
        date: DateRule::CarriedDate {
            date: "div.repertoire-separator",
            time: "p.repertoire-item-hour",
        },
        link: href("a.repertoire-item-button"),
        next_page: None,
        charset: None,
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::PodBaranami,
        origin: "https://www.kinopodbaranami.pl",
        start_path: "/repertuar.php",
        root: "li[title]",
        title: "a",
        title_first: true,
        date: DateRule::HandlerArgument {
            selector: "span a",
            attr: "onclick",
            from_end: 5,
        },
        link: href("a[onclick]"),
        next_page: None,
        charset: Some("iso-8859-2"),
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::Paradox,
        origin: "https://kinoparadox.pl",
        start_path: "/repertuar/",
        root: "div.list-item__content__row",
        title: "a.item-title",
        title_first: false,
        date: DateRule::AttrWithText {
            attr: "data-date",
            time: "div.item-time",
        },
        link: href("a.btn"),
        next_page: None,
        charset: None,
        skip_past: true,
    },
    HtmlRules {
        venue: Venue::Sfinks,
        origin: "https://kinosfinks.okn.edu.pl",
        start_path: "/wydarzenia-szukaj-strona-1.html",
        root: "span.zajawka",
        title: "span.title",
        title_first: false,
        date: DateRule::Spans {
            container: "span.kali_data_od",
            item: "span",
            date_index: 0,
            time_index: 2,
        },
        link: href("a"),
        next_page: Some("a[href][title^='Strona']"),
        charset: None,
        skip_past: true,
    },
];

pub fn html_rules(venue: Venue) -> Option<HtmlRules> {
    HTML_VENUES.iter().copied().find(|r| r.venue == venue)
}
