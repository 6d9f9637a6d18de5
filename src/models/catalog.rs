use super::{
    Connector, DeviceElement, DeviceElementConfiguration, DeviceModel, HitchPoint, MultiPolygon,
    NumericRepresentationValue, ReferenceId, UniqueId, VectorPrescription,
};
use crate::error::{FieldOpsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique id source used by the 20|20 monitor.
pub const MONITOR_ID_SOURCE: &str = "PrecisionPlanting";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grower {
    pub id: ReferenceId,
    pub name: String,
    #[serde(default)]
    pub unique_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: ReferenceId,
    pub description: String,
    #[serde(default)]
    pub grower_id: Option<ReferenceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: ReferenceId,
    pub description: String,
    #[serde(default)]
    pub farm_id: Option<ReferenceId>,
    #[serde(default)]
    pub grower_id: Option<ReferenceId>,
    #[serde(default)]
    pub area: Option<NumericRepresentationValue>,
    #[serde(default)]
    pub active_boundary_id: Option<ReferenceId>,
    #[serde(default)]
    pub unique_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoundary {
    pub id: ReferenceId,
    pub field_id: ReferenceId,
    pub spatial_data: MultiPolygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: ReferenceId,
    pub name: String,
    #[serde(default)]
    pub unique_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateContext {
    CropSeason,
    ActualStart,
    ActualEnd,
    ProposedStart,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeScope {
    pub date_context: DateContext,
    #[serde(default)]
    pub timestamp1: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamp2: Option<DateTime<Utc>>,
}

impl TimeScope {
    pub fn new(date_context: DateContext, timestamp1: DateTime<Utc>) -> Self {
        Self {
            date_context,
            timestamp1: Some(timestamp1),
            timestamp2: None,
        }
    }
}

/// One field, one crop, one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropZone {
    pub id: ReferenceId,
    pub field_id: ReferenceId,
    #[serde(default)]
    pub crop_id: Option<ReferenceId>,
    #[serde(default)]
    pub time_scopes: Vec<TimeScope>,
}

impl CropZone {
    pub fn time_scope(&self, context: DateContext) -> Option<&TimeScope> {
        self.time_scopes.iter().find(|t| t.date_context == context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Variety,
    Fertilizer,
    Chemical,
    Mix,
    Generic,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Variety => "Variety",
            ProductType::Fertilizer => "Fertilizer",
            ProductType::Chemical => "Chemical",
            ProductType::Mix => "Mix",
            ProductType::Generic => "Generic",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductForm {
    Liquid,
    Solid,
    Gas,
}

/// Mix component; `ingredient_id` names a product when `is_product` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductComponent {
    pub ingredient_id: ReferenceId,
    #[serde(default)]
    pub is_product: bool,
    #[serde(default)]
    pub quantity: Option<NumericRepresentationValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ReferenceId,
    pub description: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub form: Option<ProductForm>,
    #[serde(default)]
    pub crop_id: Option<ReferenceId>,
    #[serde(default)]
    pub components: Vec<ProductComponent>,
}

impl Product {
    pub fn new(id: ReferenceId, description: impl Into<String>, product_type: ProductType) -> Self {
        Self {
            id,
            description: description.into(),
            product_type,
            form: None,
            crop_id: None,
            components: Vec::new(),
        }
    }

    pub fn with_form(mut self, form: ProductForm) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_crop(mut self, crop_id: ReferenceId) -> Self {
        self.crop_id = Some(crop_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: ReferenceId,
    pub description: String,
}

/// Static reference data for one dataset. Relationships are by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub growers: Vec<Grower>,
    pub farms: Vec<Farm>,
    pub fields: Vec<Field>,
    pub field_boundaries: Vec<FieldBoundary>,
    pub crops: Vec<Crop>,
    pub crop_zones: Vec<CropZone>,
    pub products: Vec<Product>,
    pub ingredients: Vec<Ingredient>,
    pub device_models: Vec<DeviceModel>,
    pub device_elements: Vec<DeviceElement>,
    pub device_element_configurations: Vec<DeviceElementConfiguration>,
    pub connectors: Vec<Connector>,
    pub hitch_points: Vec<HitchPoint>,
    pub prescriptions: Vec<VectorPrescription>,
}

impl Catalog {
    pub fn grower(&self, id: ReferenceId) -> Option<&Grower> {
        self.growers.iter().find(|g| g.id == id)
    }

    pub fn farm(&self, id: ReferenceId) -> Option<&Farm> {
        self.farms.iter().find(|f| f.id == id)
    }

    pub fn field(&self, id: ReferenceId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn crop(&self, id: ReferenceId) -> Option<&Crop> {
        self.crops.iter().find(|c| c.id == id)
    }

    pub fn crop_zone(&self, id: ReferenceId) -> Option<&CropZone> {
        self.crop_zones.iter().find(|c| c.id == id)
    }

    pub fn product(&self, id: ReferenceId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn ingredient(&self, id: ReferenceId) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn device_element(&self, id: ReferenceId) -> Option<&DeviceElement> {
        self.device_elements.iter().find(|d| d.id == id)
    }

    pub fn configuration(&self, id: ReferenceId) -> Option<&DeviceElementConfiguration> {
        self.device_element_configurations
            .iter()
            .find(|c| c.id == id)
    }

    /// First configuration bound to the element, scanning in catalog order.
    pub fn configuration_for_element(
        &self,
        device_element_id: ReferenceId,
    ) -> Option<&DeviceElementConfiguration> {
        self.device_element_configurations
            .iter()
            .find(|c| c.device_element_id == device_element_id)
    }

    pub fn connector(&self, id: ReferenceId) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn hitch_point(&self, id: ReferenceId) -> Option<&HitchPoint> {
        self.hitch_points.iter().find(|h| h.id == id)
    }

    pub fn require_product(&self, id: ReferenceId) -> Result<&Product> {
        self.product(id)
            .ok_or_else(|| FieldOpsError::not_found("product", id))
    }

    pub fn require_device_element(&self, id: ReferenceId) -> Result<&DeviceElement> {
        self.device_element(id)
            .ok_or_else(|| FieldOpsError::not_found("device element", id))
    }

    pub fn require_configuration(&self, id: ReferenceId) -> Result<&DeviceElementConfiguration> {
        self.configuration(id)
            .ok_or_else(|| FieldOpsError::not_found("device element configuration", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigurationGeometry, SectionConfiguration};

    fn catalog() -> Catalog {
        Catalog {
            products: vec![
                Product::new(1, "Variety 1", ProductType::Variety),
                Product::new(2, "Starter", ProductType::Fertilizer).with_form(ProductForm::Liquid),
            ],
            device_element_configurations: vec![
                DeviceElementConfiguration {
                    id: 10,
                    device_element_id: 5,
                    description: "Row 1 (2020)".into(),
                    geometry: ConfigurationGeometry::Section(SectionConfiguration::default()),
                },
                DeviceElementConfiguration {
                    id: 11,
                    device_element_id: 5,
                    description: "Row 1 (2021)".into(),
                    geometry: ConfigurationGeometry::Section(SectionConfiguration::default()),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn lookups_by_id() {
        let catalog = catalog();
        assert_eq!(catalog.product(2).map(|p| p.description.as_str()), Some("Starter"));
        assert!(catalog.product(99).is_none());
        assert_eq!(catalog.configuration(11).map(|c| c.device_element_id), Some(5));
    }

    #[test]
    fn configuration_for_element_takes_first_match() {
        let catalog = catalog();
        assert_eq!(catalog.configuration_for_element(5).map(|c| c.id), Some(10));
        assert!(catalog.configuration_for_element(6).is_none());
    }

    #[test]
    fn require_reports_reference_not_found() {
        let catalog = catalog();
        let err = catalog.require_product(42).unwrap_err();
        assert!(matches!(
            err,
            FieldOpsError::ReferenceNotFound { kind: "product", id: 42 }
        ));
        assert!(catalog.require_device_element(1).is_err());
    }

    #[test]
    fn crop_zone_time_scope_lookup() {
        let season = DateTime::parse_from_rfc3339("2021-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let zone = CropZone {
            id: 1,
            field_id: 2,
            crop_id: Some(3),
            time_scopes: vec![TimeScope::new(DateContext::CropSeason, season)],
        };
        assert!(zone.time_scope(DateContext::CropSeason).is_some());
        assert!(zone.time_scope(DateContext::ActualStart).is_none());
    }
}
