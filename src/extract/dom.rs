//! Element query capability for rendered pages
//!
//! The extractor never talks to a browser directly. It asks a [`RenderedPage`]
//! for candidate post nodes and asks each [`PostNode`] for the text or an
//! attribute of a semantic [`Field`]. [`HtmlPage`] implements this over a
//! `scraper` snapshot of the live DOM; tests can supply their own fixtures.

use crate::config::SelectorConfig;
use scraper::{ElementRef, Html, Selector};

/// Semantic parts of a post element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Post title
    Title,
    /// Anchor rendering the relative age ("5 minutes ago")
    TimestampAnchor,
    /// Machine-readable `<time>` inside the timestamp anchor
    TimestampTime,
    /// Link to the post's comments page
    Permalink,
    /// Rendered score
    Score,
}

/// A single candidate post element
pub trait PostNode {
    /// Text content of the first element matching `field`, if any
    fn text_of(&self, field: Field) -> Option<String>;

    /// Attribute `name` of the first element matching `field`, if any
    fn attribute_of(&self, field: Field, name: &str) -> Option<String>;
}

/// A rendered page that can enumerate candidate post elements
pub trait RenderedPage {
    type Node<'a>: PostNode
    where
        Self: 'a;

    /// All post containers, in document order
    fn find_all(&self) -> Vec<Self::Node<'_>>;
}

/// Compiled CSS selectors for every post field
#[derive(Debug, Clone)]
pub struct Selectors {
    container_css: String,
    container: Selector,
    title: Selector,
    timestamp_anchor: Selector,
    timestamp_time: Selector,
    permalink: Selector,
    score: Selector,
}

impl Selectors {
    /// Compiles selectors from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Selectors)` - All selectors compiled
    /// * `Err(String)` - Description of the first selector that failed to parse
    pub fn parse(config: &SelectorConfig) -> Result<Self, String> {
        Ok(Self {
            container_css: config.container.clone(),
            container: compile("container", &config.container)?,
            title: compile("title", &config.title)?,
            timestamp_anchor: compile("timestamp-anchor", &config.timestamp_anchor)?,
            timestamp_time: compile("timestamp-time", &config.timestamp_time)?,
            permalink: compile("permalink", &config.permalink)?,
            score: compile("score", &config.score)?,
        })
    }

    /// The raw container selector, used when waiting for the listing to render
    pub fn container_css(&self) -> &str {
        &self.container_css
    }

    pub fn container(&self) -> &Selector {
        &self.container
    }

    pub fn for_field(&self, field: Field) -> &Selector {
        match field {
            Field::Title => &self.title,
            Field::TimestampAnchor => &self.timestamp_anchor,
            Field::TimestampTime => &self.timestamp_time,
            Field::Permalink => &self.permalink,
            Field::Score => &self.score,
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self::parse(&SelectorConfig::default()).expect("built-in selectors are valid CSS")
    }
}

fn compile(name: &str, css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid {} selector '{}': {:?}", name, css, e))
}

/// A parsed HTML snapshot of a rendered listing
pub struct HtmlPage<'s> {
    document: Html,
    selectors: &'s Selectors,
}

impl<'s> HtmlPage<'s> {
    pub fn parse(html: &str, selectors: &'s Selectors) -> Self {
        Self {
            document: Html::parse_document(html),
            selectors,
        }
    }
}

impl<'s> RenderedPage for HtmlPage<'s> {
    type Node<'a> = HtmlPostNode<'a> where Self: 'a;

    fn find_all(&self) -> Vec<HtmlPostNode<'_>> {
        self.document
            .select(self.selectors.container())
            .map(|element| HtmlPostNode {
                element,
                selectors: self.selectors,
            })
            .collect()
    }
}

/// One post container inside an [`HtmlPage`]
pub struct HtmlPostNode<'a> {
    element: ElementRef<'a>,
    selectors: &'a Selectors,
}

impl<'a> HtmlPostNode<'a> {
    fn first(&self, field: Field) -> Option<ElementRef<'a>> {
        self.element.select(self.selectors.for_field(field)).next()
    }
}

impl<'a> PostNode for HtmlPostNode<'a> {
    fn text_of(&self, field: Field) -> Option<String> {
        self.first(field)
            .map(|element| element.text().collect::<String>())
    }

    fn attribute_of(&self, field: Field, name: &str) -> Option<String> {
        self.first(field)
            .and_then(|element| element.value().attr(name))
            .map(str::to_string)
    }
}
