//! Shared `--patient`/`--doctor`/... argument block identifying a visit.

use clap::Args;

use charta_core::model::VisitKey;

/// Identifying parameters sent with every persistence call.
#[derive(Debug, Clone, Args)]
pub struct VisitArgs {
    /// Patient identifier
    #[arg(long)]
    pub patient: String,

    /// Doctor identifier
    #[arg(long)]
    pub doctor: String,

    /// Clinic identifier
    #[arg(long)]
    pub clinic: String,

    /// Shift identifier
    #[arg(long, default_value = "")]
    pub shift: String,

    /// Visit number
    #[arg(long)]
    pub visit_number: String,

    /// Visit date in DD-MMM-YYYY form (defaults to today)
    #[arg(long)]
    pub visit_date: Option<String>,

    /// Acting user id
    #[arg(long, default_value = "cli")]
    pub user: String,
}

impl VisitArgs {
    pub fn to_key(&self) -> VisitKey {
        let visit_date = self
            .visit_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%d-%b-%Y").to_string());
        VisitKey {
            patient_id: self.patient.clone(),
            doctor_id: self.doctor.clone(),
            clinic_id: self.clinic.clone(),
            shift: self.shift.clone(),
            visit_number: self.visit_number.clone(),
            visit_date,
            user_id: self.user.clone(),
        }
    }
}
