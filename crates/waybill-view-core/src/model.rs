//! Shipment and sensor view model.
//!
//! Linked resources arrive as stubs holding only an identifier:
//!
//! ```json
//! { "deliveryLocation": { "id": "https://example.org/locations/42" } }
//! ```
//!
//! A [`Link`] is either such a stub or the fetched body that replaced it.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Instant attached to measurements and events.
pub type Timestamp = DateTime<Utc>;

/// An untyped resource body as returned by the fetcher.
pub type Resource = Value;

/// Opaque string or URI naming a fetchable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Create a new identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier of a sub-resource, e.g. `<sensor>/measurements`.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        Self(format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            segment.trim_start_matches('/')
        ))
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An unresolved reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Identifier of the referenced resource
    pub id: Identifier,
}

impl ResourceRef {
    /// Create a stub for the given identifier.
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }

    /// Read a stub from a JSON value.
    ///
    /// Only an object whose single key is a string `id` counts as a stub.
    /// Anything carrying more data is a resolved body.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        obj.get("id").and_then(Value::as_str).map(Self::new)
    }
}

/// A link field: a stub until resolution replaces it with the fetched body.
#[derive(Debug, Clone, PartialEq)]
pub enum Link<T> {
    /// Not yet resolved
    Stub(ResourceRef),
    /// Replaced by the fetched body
    Resolved(T),
}

impl<T> Link<T> {
    /// Whether the stub has been replaced.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Link::Resolved(_))
    }

    /// The resolved body, if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Link::Resolved(body) => Some(body),
            Link::Stub(_) => None,
        }
    }

    /// The stub, if the link is still unresolved.
    #[must_use]
    pub fn stub(&self) -> Option<&ResourceRef> {
        match self {
            Link::Stub(stub) => Some(stub),
            Link::Resolved(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Link<T> {
    /// Mark a stub-shaped link as resolved.
    ///
    /// A fetched body carrying nothing but its `id` reads back as a stub;
    /// this turns the link into one holding that body.
    ///
    /// # Errors
    ///
    /// Returns error if an id-only body does not decode as `T`.
    pub fn promote(&mut self) -> Result<(), ModelError> {
        if let Link::Stub(stub) = self {
            let body = serde_json::json!({ "id": stub.id });
            let body = serde_json::from_value(body).map_err(|e| ModelError::Decode(e.to_string()))?;
            *self = Link::Resolved(body);
        }
        Ok(())
    }
}

impl<T: Serialize> Serialize for Link<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Link::Stub(stub) => stub.serialize(serializer),
            Link::Resolved(body) => body.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Link<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(stub) = ResourceRef::from_value(&value) {
            return Ok(Link::Stub(stub));
        }
        serde_json::from_value(value)
            .map(Link::Resolved)
            .map_err(D::Error::custom)
    }
}

/// A party to the shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Role of the party (shipper, consignee, ...)
    #[serde(default)]
    pub party_role: String,
    /// Party details; left as a stub unless the resolution plan opts in
    pub party_details: Link<Resource>,
}

impl Party {
    /// Identifier shown for the party, whether or not details were resolved.
    #[must_use]
    pub fn details_id(&self) -> Option<&str> {
        match &self.party_details {
            Link::Stub(stub) => Some(stub.id.as_str()),
            Link::Resolved(body) => body.get("id").and_then(Value::as_str),
        }
    }
}

/// A master or contained waybill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waybill {
    /// Identifier of the waybill resource
    pub id: Identifier,
    /// Airline or carrier prefix
    #[serde(default, deserialize_with = "scalar_string")]
    pub waybill_prefix: String,
    /// Serial number within the prefix
    #[serde(default, deserialize_with = "scalar_string")]
    pub waybill_number: String,
    /// Master or house waybill
    #[serde(default, deserialize_with = "scalar_string")]
    pub waybill_type: String,
    /// House waybills consolidated under this one
    #[serde(default)]
    pub contained_waybills: Vec<Link<Waybill>>,
    /// Remaining fields of the body
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Waybill {
    /// Prefix followed by number, as printed on the document.
    #[must_use]
    pub fn display_number(&self) -> String {
        format!("{}{}", self.waybill_prefix, self.waybill_number)
    }
}

/// Root shipment entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Parties involved, in document order
    #[serde(default)]
    pub parties: Vec<Party>,
    /// Where the shipment is delivered
    pub delivery_location: Link<Resource>,
    /// The master waybill
    pub waybill_number: Link<Waybill>,
    /// Remaining fields of the body
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shipment {
    /// Decode a (possibly partially resolved) shipment document.
    ///
    /// # Errors
    ///
    /// Returns error if the document does not have the shipment shape.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|e| ModelError::Decode(e.to_string()))
    }

    /// Mark the link at a JSON `pointer` as resolved.
    ///
    /// Used after resolution so a fetched body that only carries its `id`
    /// still counts as resolved. Pointers outside the typed model are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the id-only body does not decode.
    pub fn mark_resolved(&mut self, pointer: &str) -> Result<(), ModelError> {
        let segments: Vec<&str> = pointer.split('/').skip(1).collect();
        match segments.as_slice() {
            ["deliveryLocation"] => self.delivery_location.promote(),
            ["waybillNumber"] => self.waybill_number.promote(),
            ["waybillNumber", "containedWaybills", index] => {
                match (index.parse::<usize>(), &mut self.waybill_number) {
                    (Ok(i), Link::Resolved(master)) => master
                        .contained_waybills
                        .get_mut(i)
                        .map_or(Ok(()), Link::promote),
                    _ => Ok(()),
                }
            }
            ["parties", index, "partyDetails"] => index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.parties.get_mut(i))
                .map_or(Ok(()), |party| party.party_details.promote()),
            _ => Ok(()),
        }
    }

    /// The resolved master waybill.
    #[must_use]
    pub fn master_waybill(&self) -> Option<&Waybill> {
        self.waybill_number.resolved()
    }

    /// Resolved waybills contained in the master waybill, in document order.
    pub fn contained_waybills(&self) -> impl Iterator<Item = &Waybill> {
        self.master_waybill()
            .into_iter()
            .flat_map(|master| master.contained_waybills.iter())
            .filter_map(Link::resolved)
    }

    /// Whether location, master waybill, and every contained waybill are resolved.
    #[must_use]
    pub fn is_fully_resolved(&self) -> bool {
        self.delivery_location.is_resolved()
            && self.master_waybill().is_some_and(|master| {
                master.contained_waybills.iter().all(Link::is_resolved)
            })
    }
}

/// A sensor attached to a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    /// Identifier of the sensor resource
    pub id: Identifier,
    /// Human-readable name
    #[serde(default)]
    pub sensor_name: String,
    /// Manufacturer serial number
    #[serde(default, deserialize_with = "scalar_string")]
    pub sensor_serial_number: String,
}

impl Sensor {
    /// Identifier of the sensor's measurement series.
    #[must_use]
    pub fn measurements_id(&self) -> Identifier {
        self.id.child("measurements")
    }

    /// Caption shown above the chart.
    #[must_use]
    pub fn caption(&self) -> String {
        format!(
            "Sensor: {} - {}",
            self.sensor_name, self.sensor_serial_number
        )
    }
}

/// Measured value of a generic sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenericMeasurement {
    /// Raw reading
    pub value: f64,
}

/// One raw sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorMeasurement {
    /// When the reading was taken
    pub measurement_timestamp: Timestamp,
    /// The reading
    pub generic_measurement: GenericMeasurement,
}

/// A tracking event from the shipment's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event type name
    pub event_name: String,
    /// When the event happened
    pub date_time: Timestamp,
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

/// Errors that can occur when decoding the view model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Document does not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stub_detection() {
        assert!(ResourceRef::from_value(&json!({"id": "urn:x"})).is_some());
        assert!(ResourceRef::from_value(&json!({"id": "urn:x", "name": "Rotterdam"})).is_none());
        assert!(ResourceRef::from_value(&json!({"id": 7})).is_none());
        assert!(ResourceRef::from_value(&json!("urn:x")).is_none());
    }

    #[test]
    fn identifier_child() {
        let sensor = Identifier::new("https://api.example.org/sensors/9/");
        assert_eq!(
            sensor.child("measurements").as_str(),
            "https://api.example.org/sensors/9/measurements"
        );
    }

    #[test]
    fn unresolved_shipment_decodes_stubs() {
        let shipment = Shipment::from_value(json!({
            "id": "urn:shipment:1",
            "parties": [{"partyRole": "SHIPPER", "partyDetails": {"id": "urn:party:1"}}],
            "deliveryLocation": {"id": "urn:location:1"},
            "waybillNumber": {"id": "urn:waybill:1"}
        }))
        .unwrap();

        assert!(!shipment.delivery_location.is_resolved());
        assert!(shipment.master_waybill().is_none());
        assert!(!shipment.is_fully_resolved());
        assert_eq!(shipment.parties[0].details_id(), Some("urn:party:1"));
        assert_eq!(shipment.extra.get("id"), Some(&json!("urn:shipment:1")));
    }

    #[test]
    fn resolved_shipment_decodes_bodies() {
        let shipment = Shipment::from_value(json!({
            "parties": [],
            "deliveryLocation": {"id": "urn:location:1", "name": "Hamburg"},
            "waybillNumber": {
                "id": "urn:waybill:1",
                "waybillPrefix": 176,
                "waybillNumber": "12345675",
                "waybillType": "MASTER",
                "containedWaybills": [
                    {"id": "urn:waybill:2", "waybillPrefix": "176", "waybillNumber": 1, "waybillType": "HOUSE"}
                ]
            }
        }))
        .unwrap();

        assert!(shipment.is_fully_resolved());
        let master = shipment.master_waybill().unwrap();
        assert_eq!(master.display_number(), "17612345675");
        let contained: Vec<_> = shipment.contained_waybills().collect();
        assert_eq!(contained.len(), 1);
        assert_eq!(contained[0].waybill_type, "HOUSE");
    }

    #[test]
    fn id_only_bodies_marked_resolved() {
        let mut shipment = Shipment::from_value(json!({
            "parties": [{"partyRole": "SHIPPER", "partyDetails": {"id": "urn:party:1"}}],
            "deliveryLocation": {"id": "urn:location:1"},
            "waybillNumber": {"id": "urn:waybill:1", "containedWaybills": [{"id": "urn:waybill:2"}]}
        }))
        .unwrap();
        assert!(!shipment.delivery_location.is_resolved());

        for pointer in [
            "/deliveryLocation",
            "/waybillNumber/containedWaybills/0",
            "/parties/0/partyDetails",
            "/unknown/field",
        ] {
            shipment.mark_resolved(pointer).unwrap();
        }

        assert_eq!(
            shipment.delivery_location.resolved(),
            Some(&json!({"id": "urn:location:1"}))
        );
        assert!(shipment.is_fully_resolved());
        assert_eq!(
            shipment.contained_waybills().next().map(|w| w.id.as_str()),
            Some("urn:waybill:2")
        );
        assert!(shipment.parties[0].party_details.is_resolved());
    }

    #[test]
    fn link_serializes_transparently() {
        let link: Link<Resource> = Link::Stub(ResourceRef::new("urn:a"));
        assert_eq!(serde_json::to_value(&link).unwrap(), json!({"id": "urn:a"}));

        let link: Link<Resource> = Link::Resolved(json!({"id": "urn:a", "city": "Oslo"}));
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({"id": "urn:a", "city": "Oslo"})
        );
    }

    #[test]
    fn sensor_caption_and_measurements_id() {
        let sensor: Sensor = serde_json::from_value(json!({
            "id": "https://api.example.org/sensors/9",
            "sensorName": "Reefer temperature",
            "sensorSerialNumber": 4411
        }))
        .unwrap();

        assert_eq!(sensor.caption(), "Sensor: Reefer temperature - 4411");
        assert_eq!(
            sensor.measurements_id().as_str(),
            "https://api.example.org/sensors/9/measurements"
        );
    }

    #[test]
    fn waybill_rejects_structured_number() {
        let result = serde_json::from_value::<Waybill>(json!({
            "id": "urn:waybill:1",
            "waybillNumber": {"nested": true}
        }));
        assert!(result.is_err());
    }
}
