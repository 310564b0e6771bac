//! Clock-in reference catalog.
//!
//! Jobsites, cost codes, and equipment loaded from data rows. Scanned QR
//! codes are resolved against this catalog.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::logging::structured::LogContext;
use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jobsite {
    pub id: String,
    pub qr_code: String,
    pub name: String,
}

/// A cost code, scoped to one jobsite or usable everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCode {
    pub code: String,
    pub name: String,
    pub jobsite_id: Option<String>,
}

impl CostCode {
    pub fn applies_to(&self, jobsite_id: &str) -> bool {
        self.jobsite_id.as_deref().map_or(true, |id| id == jobsite_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentKind {
    Truck,
    Trailer,
    Vehicle,
    Equipment,
}

impl FromStr for EquipmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truck" => Ok(EquipmentKind::Truck),
            "trailer" => Ok(EquipmentKind::Trailer),
            "vehicle" => Ok(EquipmentKind::Vehicle),
            "equipment" => Ok(EquipmentKind::Equipment),
            other => Err(format!("unknown equipment kind {other:?}")),
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EquipmentKind::Truck => "truck",
            EquipmentKind::Trailer => "trailer",
            EquipmentKind::Vehicle => "vehicle",
            EquipmentKind::Equipment => "equipment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub qr_code: String,
    pub name: String,
    pub kind: EquipmentKind,
}

#[derive(Debug, Default)]
pub struct Catalog {
    jobsites: HashMap<String, Jobsite>,
    jobsite_by_qr: HashMap<String, String>,
    cost_codes: Vec<CostCode>,
    equipment: HashMap<String, Equipment>,
    equipment_by_qr: HashMap<String, String>,
    loaded: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load the catalog from data rows, replacing anything loaded before.
    ///
    /// # Arguments
    /// * `jobsites` - (id, qr_code, name)
    /// * `cost_codes` - (code, name, jobsite_id)
    /// * `equipment` - (id, qr_code, name, kind); rows with an unknown kind are skipped
    pub fn load_from_rows(
        &mut self,
        jobsites: Vec<(String, String, String)>,
        cost_codes: Vec<(String, String, Option<String>)>,
        equipment: Vec<(String, String, String, String)>,
    ) {
        self.jobsites.clear();
        self.jobsite_by_qr.clear();
        for (id, qr_code, name) in jobsites {
            self.jobsite_by_qr.insert(qr_code.trim().to_string(), id.clone());
            self.jobsites.insert(id.clone(), Jobsite { id, qr_code, name });
        }

        self.cost_codes = cost_codes
            .into_iter()
            .map(|(code, name, jobsite_id)| CostCode {
                code,
                name,
                jobsite_id,
            })
            .collect();

        self.equipment.clear();
        self.equipment_by_qr.clear();
        let mut skipped = 0usize;
        for (id, qr_code, name, kind) in equipment {
            let Ok(kind) = kind.parse::<EquipmentKind>() else {
                skipped += 1;
                continue;
            };
            self.equipment_by_qr.insert(qr_code.trim().to_string(), id.clone());
            self.equipment.insert(
                id.clone(),
                Equipment {
                    id,
                    qr_code,
                    name,
                    kind,
                },
            );
        }
        self.loaded = true;

        log_info!(
            LogContext::new("catalog"),
            "CATALOG_LOADED",
            jobsites = self.jobsites.len(),
            cost_codes = self.cost_codes.len(),
            equipment = self.equipment.len(),
            skipped_equipment = skipped
        );
    }

    pub fn jobsite(&self, id: &str) -> Option<&Jobsite> {
        self.jobsites.get(id)
    }

    /// Jobsites sorted by name, for the manual selection list.
    pub fn jobsites(&self) -> Vec<&Jobsite> {
        let mut all: Vec<&Jobsite> = self.jobsites.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Resolve a scanned code. Matching is exact after trimming whitespace.
    pub fn resolve_jobsite_qr(&self, scanned: &str, ctx: &LogContext) -> Option<&Jobsite> {
        let code = scanned.trim();
        log_debug!(ctx, "QR_LOOKUP", code = code);
        match self.jobsite_by_qr.get(code).and_then(|id| self.jobsites.get(id)) {
            Some(jobsite) => {
                log_info!(ctx, "QR_MATCHED", jobsite = &jobsite.id);
                Some(jobsite)
            }
            None => {
                log_warn!(ctx, "QR_UNKNOWN", code = code, known_jobsites = self.jobsites.len());
                None
            }
        }
    }

    /// Cost codes usable at `jobsite_id`, sorted by code.
    pub fn cost_codes_for(&self, jobsite_id: &str) -> Vec<&CostCode> {
        let mut codes: Vec<&CostCode> = self
            .cost_codes
            .iter()
            .filter(|c| c.applies_to(jobsite_id))
            .collect();
        codes.sort_by(|a, b| a.code.cmp(&b.code));
        codes
    }

    pub fn is_cost_code_valid(&self, jobsite_id: &str, code: &str) -> bool {
        self.cost_codes
            .iter()
            .any(|c| c.code == code && c.applies_to(jobsite_id))
    }

    pub fn equipment(&self, id: &str) -> Option<&Equipment> {
        self.equipment.get(id)
    }

    pub fn resolve_equipment_qr(&self, scanned: &str) -> Option<&Equipment> {
        self.equipment_by_qr
            .get(scanned.trim())
            .and_then(|id| self.equipment.get(id))
    }

    pub fn equipment_of_kind(&self, kind: EquipmentKind) -> Vec<&Equipment> {
        let mut matching: Vec<&Equipment> =
            self.equipment.values().filter(|e| e.kind == kind).collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matching
    }
}
