//! STAC item model.
//!
//! Only the parts of the STAC item schema the pipeline writes are modelled
//! as typed fields; anything else round-trips through the `additional` maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sst_common::{BoundingBox, GridSpec};

use crate::{CatalogError, CatalogResult, PROJECTION_EXTENSION, RASTER_EXTENSION, STAC_VERSION};

pub const REL_SELF: &str = "self";
pub const REL_CANONICAL: &str = "canonical";

/// GeoJSON polygon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl Geometry {
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self {
            geometry_type: "Polygon".to_string(),
            coordinates: vec![bbox.exterior_ring().to_vec()],
        }
    }
}

/// One entry of an asset's `raster:bands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterBand {
    pub nodata: i64,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(rename = "raster:bands", default, skip_serializing_if = "Vec::is_empty")]
    pub raster_bands: Vec<RasterBand>,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            media_type: None,
            roles: Vec::new(),
            raster_bands: Vec::new(),
            additional: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_raster_bands(mut self, bands: Vec<RasterBand>) -> Self {
        self.raster_bands = bands;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Item properties: temporal bounds plus the projection extension fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Properties {
    /// Always serialized; `null` is valid when start/end are given.
    pub datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(rename = "proj:epsg", skip_serializing_if = "Option::is_none")]
    pub proj_epsg: Option<u32>,
    #[serde(rename = "proj:shape", skip_serializing_if = "Option::is_none")]
    pub proj_shape: Option<[usize; 2]>,
    #[serde(rename = "proj:transform", skip_serializing_if = "Option::is_none")]
    pub proj_transform: Option<Vec<f64>>,
    #[serde(rename = "proj:bbox", skip_serializing_if = "Option::is_none")]
    pub proj_bbox: Option<[f64; 4]>,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

/// A STAC item (GeoJSON feature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub item_type: String,
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub geometry: Geometry,
    pub bbox: [f64; 4],
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl Item {
    /// Replace the `self` link, keeping exactly one.
    pub fn set_self_href(&mut self, href: impl Into<String>) {
        self.links.retain(|l| l.rel != REL_SELF);
        self.links
            .push(Link::new(REL_SELF, href).with_media_type("application/json"));
    }

    pub fn self_href(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == REL_SELF)
            .map(|l| l.href.as_str())
    }

    /// Pretty-printed JSON, the form items are persisted in.
    pub fn to_json_bytes(&self) -> CatalogResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> CatalogResult<Self> {
        let item: Item = serde_json::from_slice(bytes)?;
        if item.item_type != "Feature" {
            return Err(CatalogError::InvalidItem(format!(
                "{}: type is {}, expected Feature",
                item.id, item.item_type
            )));
        }
        Ok(item)
    }
}

/// Builds an [`Item`] whose footprint and projection come from a grid.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    id: String,
    grid: GridSpec,
    datetime: Option<DateTime<Utc>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    assets: BTreeMap<String, Asset>,
    links: Vec<Link>,
}

impl ItemBuilder {
    pub fn new(id: impl Into<String>, grid: &GridSpec) -> Self {
        Self {
            id: id.into(),
            grid: grid.clone(),
            datetime: None,
            start: None,
            end: None,
            assets: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    pub fn datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn time_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn asset(mut self, key: impl Into<String>, asset: Asset) -> Self {
        self.assets.insert(key.into(), asset);
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn build(self) -> CatalogResult<Item> {
        if self.datetime.is_none() && (self.start.is_none() || self.end.is_none()) {
            return Err(CatalogError::InvalidItem(format!(
                "{}: needs a datetime or a start and end",
                self.id
            )));
        }
        if self.assets.is_empty() {
            return Err(CatalogError::InvalidItem(format!("{}: no assets", self.id)));
        }

        let bbox = self.grid.bbox();
        let properties = Properties {
            datetime: self.datetime,
            start_datetime: self.start,
            end_datetime: self.end,
            proj_epsg: Some(self.grid.crs.epsg),
            proj_shape: Some([self.grid.rows, self.grid.cols]),
            proj_transform: Some(self.grid.transform.to_affine9().to_vec()),
            proj_bbox: Some(bbox.to_array()),
            additional: BTreeMap::new(),
        };

        Ok(Item {
            item_type: "Feature".to_string(),
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: vec![
                PROJECTION_EXTENSION.to_string(),
                RASTER_EXTENSION.to_string(),
            ],
            id: self.id,
            geometry: Geometry::from_bbox(&bbox),
            bbox: bbox.to_array(),
            properties,
            links: self.links,
            assets: self.assets,
            collection: None,
        })
    }
}
