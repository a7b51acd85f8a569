//! GeoRSS Simple points.

use std::any::Any;
use std::sync::Arc;

use super::factory::{ElementWrapper, SimpleExtensionFactory};
use crate::element::Element;
use crate::error::WrapperError;
use crate::qname::{ns, QName};

/// `georss:point`
pub fn point() -> QName {
    QName::prefixed(ns::GEORSS, "point", "georss")
}

/// A WGS84 latitude/longitude pair written as `"lat long"`.
#[derive(Debug)]
pub struct Point {
    element: Arc<Element>,
    latitude: f64,
    longitude: f64,
}

impl Point {
    pub fn new(element: Arc<Element>) -> Result<Self, WrapperError> {
        let text = element.text_content();
        let mut parts = text.split_whitespace().map(str::parse::<f64>);
        let (Some(Ok(latitude)), Some(Ok(longitude)), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(WrapperError::new(element.name(), format!("malformed point '{text}'")));
        };
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WrapperError::new(element.name(), format!("point out of range '{text}'")));
        }
        Ok(Self {
            element,
            latitude,
            longitude,
        })
    }

    /// Build a new `georss:point` element.
    #[must_use]
    pub fn element_for(latitude: f64, longitude: f64) -> Element {
        Element::new(point()).with_text(format!("{latitude} {longitude}"))
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl ElementWrapper for Point {
    fn element(&self) -> &Arc<Element> {
        &self.element
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for GeoRSS Simple.
#[must_use]
pub fn georss_factory() -> SimpleExtensionFactory {
    SimpleExtensionFactory::new([ns::GEORSS]).add_impl(point(), Point::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionFactory;

    #[test]
    fn test_point() {
        let extension = georss_factory().element_wrapper(Arc::new(Point::element_for(45.256, -71.92)));
        let point = extension.downcast_ref::<Point>().unwrap();
        assert_eq!(point.latitude(), 45.256);
        assert_eq!(point.longitude(), -71.92);
    }

    #[test]
    fn test_malformed_points_stay_plain() {
        for text in ["45.256", "north west", "1 2 3", "95 10"] {
            let element = Arc::new(Element::new(point()).with_text(text));
            assert!(!georss_factory().element_wrapper(element).is_wrapped(), "{text}");
        }
    }
}
