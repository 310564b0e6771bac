//! Patch records.
//!
//! The minimal per-kind shapes sent to the persistence API: an id plus the
//! fields that are set. Sub-entry patches also remember their parent entry id
//! for local matching, but the parent is not part of the wire shape.
//!
//! Every field is `Option<Option<T>>`: `None` leaves the stored value alone
//! and is omitted on the wire, `Some(None)` clears it and is sent as `null`,
//! `Some(Some(v))` sets it.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Carry a working-copy value: set when present, omitted otherwise.
pub fn carry<T: Clone>(value: &Option<T>) -> Option<Option<T>> {
    value.clone().map(Some)
}

/// The value a field sets, if it sets one.
pub fn carried<T>(field: &Option<Option<T>>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

/// Keep `new` only when it differs from `old`. A value present before and
/// absent now becomes an explicit clear.
fn changed<T: PartialEq + Clone>(
    new: &Option<Option<T>>,
    old: &Option<Option<T>>,
) -> Option<Option<T>> {
    if new == old {
        None
    } else {
        Some(new.clone().flatten())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobsite_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_code: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MileagePatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_mileage: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_mileage: Option<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HauledItemPatch {
    pub id: String,
    #[serde(skip)]
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobsite_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    pub id: String,
    #[serde(skip)]
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_of_material: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_weight: Option<Option<f64>>,
}

/// Shared by equipment, trucking, and tasco refuels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelPatch {
    pub id: String,
    #[serde(skip)]
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallons_refueled: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miles_at_fueling: Option<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMileagePatch {
    pub id: String,
    #[serde(skip)]
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_line_mileage: Option<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TascoHaulPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_quantity: Option<Option<f64>>,
}

/// Equipment usage and maintenance sessions share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Option<String>>,
}

/// One unit sent to the persistence API.
///
/// Untagged: the kind travels alongside the list, not inside each record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatchRecord {
    Highlight(HighlightPatch),
    Mileage(MileagePatch),
    HauledItem(HauledItemPatch),
    Material(MaterialPatch),
    Refuel(RefuelPatch),
    StateMileage(StateMileagePatch),
    TascoHaul(TascoHaulPatch),
    Session(SessionPatch),
}

impl PatchRecord {
    pub fn id(&self) -> &str {
        match self {
            PatchRecord::Highlight(p) => &p.id,
            PatchRecord::Mileage(p) => &p.id,
            PatchRecord::HauledItem(p) => &p.id,
            PatchRecord::Material(p) => &p.id,
            PatchRecord::Refuel(p) => &p.id,
            PatchRecord::StateMileage(p) => &p.id,
            PatchRecord::TascoHaul(p) => &p.id,
            PatchRecord::Session(p) => &p.id,
        }
    }

    /// Owning entry id for sub-entry patches.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            PatchRecord::HauledItem(p) => Some(&p.parent_id),
            PatchRecord::Material(p) => Some(&p.parent_id),
            PatchRecord::Refuel(p) => Some(&p.parent_id),
            PatchRecord::StateMileage(p) => Some(&p.parent_id),
            _ => None,
        }
    }

    /// Match key: `(parentId, id)` for sub entries, `("", id)` for leaf entries.
    pub fn match_key(&self) -> (&str, &str) {
        (self.parent_id().unwrap_or(""), self.id())
    }

    /// True when no field is carried.
    pub fn is_blank(&self) -> bool {
        match self {
            PatchRecord::Highlight(p) => {
                p.start_time.is_none()
                    && p.end_time.is_none()
                    && p.jobsite_id.is_none()
                    && p.cost_code.is_none()
            }
            PatchRecord::Mileage(p) => p.starting_mileage.is_none() && p.ending_mileage.is_none(),
            PatchRecord::HauledItem(p) => p.equipment_id.is_none() && p.jobsite_id.is_none(),
            PatchRecord::Material(p) => {
                p.name.is_none()
                    && p.location_of_material.is_none()
                    && p.quantity.is_none()
                    && p.material_weight.is_none()
                    && p.light_weight.is_none()
                    && p.gross_weight.is_none()
            }
            PatchRecord::Refuel(p) => p.gallons_refueled.is_none() && p.miles_at_fueling.is_none(),
            PatchRecord::StateMileage(p) => p.state.is_none() && p.state_line_mileage.is_none(),
            PatchRecord::TascoHaul(p) => {
                p.shift_type.is_none()
                    && p.equipment_id.is_none()
                    && p.labor_type.is_none()
                    && p.material_type.is_none()
                    && p.load_quantity.is_none()
            }
            PatchRecord::Session(p) => {
                p.equipment_id.is_none()
                    && p.start_time.is_none()
                    && p.end_time.is_none()
                    && p.comment.is_none()
            }
        }
    }

    /// Reduce this patch to the fields that differ from `original`.
    ///
    /// Returns `None` when nothing changed. A patch with no original
    /// counterpart is returned whole. Mismatched variants compare as
    /// entirely changed.
    pub fn changed_since(&self, original: Option<&PatchRecord>) -> Option<PatchRecord> {
        let Some(original) = original else {
            return Some(self.clone());
        };

        let reduced = match (self, original) {
            (PatchRecord::Highlight(new), PatchRecord::Highlight(old)) => {
                PatchRecord::Highlight(HighlightPatch {
                    id: new.id.clone(),
                    start_time: changed(&new.start_time, &old.start_time),
                    end_time: changed(&new.end_time, &old.end_time),
                    jobsite_id: changed(&new.jobsite_id, &old.jobsite_id),
                    cost_code: changed(&new.cost_code, &old.cost_code),
                })
            }
            (PatchRecord::Mileage(new), PatchRecord::Mileage(old)) => {
                PatchRecord::Mileage(MileagePatch {
                    id: new.id.clone(),
                    starting_mileage: changed(&new.starting_mileage, &old.starting_mileage),
                    ending_mileage: changed(&new.ending_mileage, &old.ending_mileage),
                })
            }
            (PatchRecord::HauledItem(new), PatchRecord::HauledItem(old)) => {
                PatchRecord::HauledItem(HauledItemPatch {
                    id: new.id.clone(),
                    parent_id: new.parent_id.clone(),
                    equipment_id: changed(&new.equipment_id, &old.equipment_id),
                    jobsite_id: changed(&new.jobsite_id, &old.jobsite_id),
                })
            }
            (PatchRecord::Material(new), PatchRecord::Material(old)) => {
                PatchRecord::Material(MaterialPatch {
                    id: new.id.clone(),
                    parent_id: new.parent_id.clone(),
                    name: changed(&new.name, &old.name),
                    location_of_material: changed(
                        &new.location_of_material,
                        &old.location_of_material,
                    ),
                    quantity: changed(&new.quantity, &old.quantity),
                    material_weight: changed(&new.material_weight, &old.material_weight),
                    light_weight: changed(&new.light_weight, &old.light_weight),
                    gross_weight: changed(&new.gross_weight, &old.gross_weight),
                })
            }
            (PatchRecord::Refuel(new), PatchRecord::Refuel(old)) => {
                PatchRecord::Refuel(RefuelPatch {
                    id: new.id.clone(),
                    parent_id: new.parent_id.clone(),
                    gallons_refueled: changed(&new.gallons_refueled, &old.gallons_refueled),
                    miles_at_fueling: changed(&new.miles_at_fueling, &old.miles_at_fueling),
                })
            }
            (PatchRecord::StateMileage(new), PatchRecord::StateMileage(old)) => {
                PatchRecord::StateMileage(StateMileagePatch {
                    id: new.id.clone(),
                    parent_id: new.parent_id.clone(),
                    state: changed(&new.state, &old.state),
                    state_line_mileage: changed(&new.state_line_mileage, &old.state_line_mileage),
                })
            }
            (PatchRecord::TascoHaul(new), PatchRecord::TascoHaul(old)) => {
                PatchRecord::TascoHaul(TascoHaulPatch {
                    id: new.id.clone(),
                    shift_type: changed(&new.shift_type, &old.shift_type),
                    equipment_id: changed(&new.equipment_id, &old.equipment_id),
                    labor_type: changed(&new.labor_type, &old.labor_type),
                    material_type: changed(&new.material_type, &old.material_type),
                    load_quantity: changed(&new.load_quantity, &old.load_quantity),
                })
            }
            (PatchRecord::Session(new), PatchRecord::Session(old)) => {
                PatchRecord::Session(SessionPatch {
                    id: new.id.clone(),
                    equipment_id: changed(&new.equipment_id, &old.equipment_id),
                    start_time: changed(&new.start_time, &old.start_time),
                    end_time: changed(&new.end_time, &old.end_time),
                    comment: changed(&new.comment, &old.comment),
                })
            }
            _ => return Some(self.clone()),
        };

        if reduced.is_blank() {
            None
        } else {
            Some(reduced)
        }
    }
}
