//! Atompub service and category documents (RFC 5023).

use crate::document::Document;
use crate::element::Element;
use crate::error::{ModelError, Result};
use crate::qname::{ns, QName};

/// An `atom:category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub term: String,
    pub scheme: Option<String>,
    pub label: Option<String>,
}

impl Category {
    #[must_use]
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: None,
            label: None,
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(QName::atom("category")).with_attribute(QName::local("term"), &self.term);
        if let Some(scheme) = &self.scheme {
            element.set_attribute(QName::local("scheme"), scheme);
        }
        if let Some(label) = &self.label {
            element.set_attribute(QName::local("label"), label);
        }
        element
    }

    fn from_element(element: &Element) -> Option<Self> {
        Some(Self {
            term: element.attr("term")?.to_string(),
            scheme: element.attr("scheme").map(str::to_string),
            label: element.attr("label").map(str::to_string),
        })
    }
}

/// An `app:categories` document or inline element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories {
    pub fixed: bool,
    pub scheme: Option<String>,
    pub href: Option<String>,
    pub categories: Vec<Category>,
}

impl Categories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Reference out-of-line categories instead of listing them.
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.categories.push(Category::new(term));
        self
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(QName::app("categories"));
        if let Some(href) = &self.href {
            element.set_attribute(QName::local("href"), href);
            return element;
        }
        element.set_attribute(QName::local("fixed"), if self.fixed { "yes" } else { "no" });
        if let Some(scheme) = &self.scheme {
            element.set_attribute(QName::local("scheme"), scheme);
        }
        for category in &self.categories {
            element.push_element(category.to_element());
        }
        element
    }

    /// Read an `app:categories` element.
    pub fn from_element(element: &Element) -> Result<Self> {
        expect_root(element, "categories")?;
        Ok(Self {
            fixed: element.attr("fixed") == Some("yes"),
            scheme: element.attr("scheme").map(str::to_string),
            href: element.attr("href").map(str::to_string),
            categories: element
                .find_children(&QName::atom("category"))
                .filter_map(|category| Category::from_element(category))
                .collect(),
        })
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        Document::new(self.to_element())
    }
}

/// An `app:accept` value with its optional `alternate` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accept {
    pub media_range: String,
    pub alternate: Option<String>,
}

/// An `app:collection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub href: String,
    pub title: String,
    pub accepts: Vec<Accept>,
    pub categories: Option<Categories>,
}

impl Collection {
    #[must_use]
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
            accepts: Vec::new(),
            categories: None,
        }
    }

    #[must_use]
    pub fn accept(mut self, media_range: impl Into<String>, alternate: Option<&str>) -> Self {
        self.accepts.push(Accept {
            media_range: media_range.into(),
            alternate: alternate.filter(|a| !a.is_empty()).map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: Categories) -> Self {
        self.categories = Some(categories);
        self
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(QName::app("collection"))
            .with_attribute(QName::local("href"), &self.href)
            .with_child(Element::new(QName::atom("title")).with_text(&self.title));
        for accept in &self.accepts {
            let mut child = Element::new(QName::app("accept")).with_text(&accept.media_range);
            if let Some(alternate) = &accept.alternate {
                child.set_attribute(QName::local("alternate"), alternate);
            }
            element.push_element(child);
        }
        if let Some(categories) = &self.categories {
            element.push_element(categories.to_element());
        }
        element
    }

    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            href: element.attr("href").unwrap_or_default().to_string(),
            title: element.child_text(&QName::atom("title")).unwrap_or_default(),
            accepts: element
                .find_children(&QName::app("accept"))
                .map(|accept| Accept {
                    media_range: accept.text_content().trim().to_string(),
                    alternate: accept.attr("alternate").map(str::to_string),
                })
                .collect(),
            categories: element
                .find_child(&QName::app("categories"))
                .map(|categories| Categories::from_element(categories))
                .transpose()?,
        })
    }
}

/// An `app:workspace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub title: String,
    pub collections: Vec<Collection>,
}

impl Workspace {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            collections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(QName::app("workspace"))
            .with_child(Element::new(QName::atom("title")).with_text(&self.title));
        for collection in &self.collections {
            element.push_element(collection.to_element());
        }
        element
    }
}

/// An `app:service` document.
///
/// # Examples
/// ```
/// use abdera_model::app::{Collection, Service, Workspace};
///
/// let service = Service::new().with_workspace(
///     Workspace::new("Main").with_collection(
///         Collection::new("/entries", "Entries").accept("image/*", Some("multipart-related")),
///     ),
/// );
/// let element = service.to_element();
/// assert_eq!(Service::from_element(&element).unwrap(), service);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub workspaces: Vec<Workspace>,
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspaces.push(workspace);
        self
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(QName::app("service"));
        for workspace in &self.workspaces {
            element.push_element(workspace.to_element());
        }
        element
    }

    /// Read an `app:service` element.
    pub fn from_element(element: &Element) -> Result<Self> {
        expect_root(element, "service")?;
        let workspaces = element
            .find_children(&QName::app("workspace"))
            .map(|workspace| {
                Ok(Workspace {
                    title: workspace.child_text(&QName::atom("title")).unwrap_or_default(),
                    collections: workspace
                        .find_children(&QName::app("collection"))
                        .map(|collection| Collection::from_element(collection))
                        .collect::<Result<_>>()?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { workspaces })
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        Document::new(self.to_element())
    }
}

fn expect_root(element: &Element, local: &str) -> Result<()> {
    if element.name().is(ns::APP, local) {
        Ok(())
    } else {
        Err(ModelError::UnexpectedRoot {
            expected: QName::app(local),
            found: element.name().clone(),
        })
    }
}
