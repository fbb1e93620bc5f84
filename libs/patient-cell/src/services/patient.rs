use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientRecord, PatientView, SortField, SortOrder,
    UpdatePatientRequest,
};
use crate::services::store::RecordStore;

pub struct PatientService {
    store: Arc<dyn RecordStore>,
    // Serializes load -> mutate -> save so concurrent writers in this process
    // cannot lose each other's updates.
    write_lock: Mutex<()>,
}

impl PatientService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Every stored patient, in document order.
    pub async fn list_patients(&self) -> Result<Vec<PatientView>, PatientError> {
        let document = self.store.load().await?;
        let patients = document
            .records()?
            .into_iter()
            .map(|(id, record)| PatientView { id, record })
            .collect::<Vec<_>>();

        debug!("Loaded {} patients", patients.len());
        Ok(patients)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientRecord, PatientError> {
        debug!("Fetching patient: {}", patient_id);

        let document = self.store.load().await?;
        document
            .get(patient_id)?
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Creating patient: {}", request.id);

        let patient = request.validate().map_err(PatientError::Validation)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;

        if document.contains(patient.id()) {
            return Err(PatientError::AlreadyExists(patient.id().to_string()));
        }

        document.insert(patient.id(), &patient.to_record())?;
        self.store.save(&document).await?;

        info!("Patient {} created (bmi {}, {})", patient.id(), patient.bmi(), patient.verdict());
        Ok(patient)
    }

    /// Stable sort on one numeric field. Equal keys keep document order in
    /// both directions.
    pub async fn sort_patients(
        &self,
        field: SortField,
        order: SortOrder,
    ) -> Result<Vec<PatientView>, PatientError> {
        debug!("Sorting patients by {:?} {:?}", field, order);

        let mut patients = self.list_patients().await?;
        patients.sort_by(|a, b| {
            let (a, b) = (a.record.sort_key(field), b.record.sort_key(field));
            match order {
                SortOrder::Asc => a.total_cmp(&b),
                SortOrder::Desc => b.total_cmp(&a),
            }
        });
        Ok(patients)
    }

    /// Overlay the edit onto the stored record and re-validate the result as
    /// a whole patient. Nothing is written unless the merged patient is valid.
    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient: {}", patient_id);

        request.validate().map_err(PatientError::Validation)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;

        let existing = document
            .get(patient_id)?
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))?;

        let patient = request
            .merge_onto(patient_id, &existing)
            .validate()
            .map_err(PatientError::Validation)?;

        document.insert(patient_id, &patient.to_record())?;
        self.store.save(&document).await?;

        info!("Patient {} updated (bmi {}, {})", patient_id, patient.bmi(), patient.verdict());
        Ok(patient)
    }

    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        debug!("Deleting patient: {}", patient_id);

        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;

        if !document.remove(patient_id) {
            return Err(PatientError::NotFound(patient_id.to_string()));
        }
        self.store.save(&document).await?;

        info!("Patient {} deleted", patient_id);
        Ok(())
    }
}
