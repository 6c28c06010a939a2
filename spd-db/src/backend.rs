//! The mock database as a [`Backend`].

use crate::Database;
use async_trait::async_trait;
use spd_core::api::{
    ApiError, ApiResult, Backend, PlantPage, RecomputeRequest, RecomputeResponse, ReportRequest,
};
use spd_core::plant::{Plant, PlantDraft};
use spd_core::report::DatapointReport;

const PLANT_NOT_FOUND: &str = "Plant not found";

fn transport(e: anyhow::Error) -> ApiError {
    log::error!("[SPD] db: {:#}", e);
    ApiError::Transport(e.to_string())
}

impl Database {
    fn require_plant(&self, uid: &str) -> ApiResult<Plant> {
        self.query_plant(uid)
            .map_err(transport)?
            .ok_or_else(|| ApiError::NotFound(PLANT_NOT_FOUND.to_string()))
    }
}

#[async_trait(?Send)]
impl Backend for Database {
    async fn list_plants(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
    ) -> ApiResult<PlantPage> {
        self.query_plants(limit, offset, search).map_err(transport)
    }

    async fn get_plant(&self, uid: &str) -> ApiResult<Plant> {
        self.require_plant(uid)
    }

    async fn create_plant(&self, draft: &PlantDraft) -> ApiResult<Plant> {
        let draft = draft.validated()?;
        self.insert_plant(&draft.name).map_err(transport)
    }

    async fn update_plant(&self, uid: &str, draft: &PlantDraft) -> ApiResult<Plant> {
        let draft = draft.validated()?;
        self.rename_plant(uid, &draft.name)
            .map_err(transport)?
            .ok_or_else(|| ApiError::NotFound(PLANT_NOT_FOUND.to_string()))
    }

    async fn delete_plant(&self, uid: &str) -> ApiResult<()> {
        if self.remove_plant(uid).map_err(transport)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(PLANT_NOT_FOUND.to_string()))
        }
    }

    async fn report_chunk(&self, request: &ReportRequest) -> ApiResult<Vec<DatapointReport>> {
        self.require_plant(&request.plant_id)?;
        let month = request
            .month()
            .map_err(|e| ApiError::Validation(format!("Invalid report date: {}", e)))?;
        self.query_report_month(&request.plant_id, month)
            .map_err(transport)
    }

    async fn request_recompute(&self, request: &RecomputeRequest) -> ApiResult<RecomputeResponse> {
        self.require_plant(&request.plant_id)?;
        let (from, to) = request
            .span()
            .map_err(|e| ApiError::Validation(format!("Invalid date: {}", e)))?;
        if from > to {
            return Err(ApiError::Validation(
                "From date must be less than or equal to to date".to_string(),
            ));
        }
        self.generate_datapoints(&request.plant_id, from, to)
            .map_err(transport)?;
        Ok(RecomputeResponse { ok: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn crud_through_backend() {
        let db = Database::new().unwrap();
        let created = db.create_plant(&PlantDraft::new("  Rooftop  ")).await.unwrap();
        assert_eq!(created.name, "Rooftop");
        assert_eq!(db.get_plant(&created.uid).await.unwrap(), created);

        let renamed = db
            .update_plant(&created.uid, &PlantDraft::new("Carport"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Carport");

        Backend::delete_plant(&db, &created.uid).await.unwrap();
        assert!(db.get_plant(&created.uid).await.unwrap_err().is_not_found());
        assert!(Backend::delete_plant(&db, &created.uid)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let db = Database::new().unwrap();
        let err = db.create_plant(&PlantDraft::new("   ")).await.unwrap_err();
        assert_eq!(err, ApiError::Validation("Plant name is required".into()));
        assert_eq!(db.query_plants(10, 0, None).unwrap().count, 0);
    }

    #[tokio::test]
    async fn report_is_empty_until_recomputed() {
        let db = Database::new().unwrap();
        let plant = db.insert_plant("Alpha").unwrap();
        let request = ReportRequest::for_month(&plant.uid, ymd(2025, 4, 1));
        assert!(db.report_chunk(&request).await.unwrap().is_empty());

        let recompute = RecomputeRequest::new(&plant.uid, ymd(2025, 4, 1), ymd(2025, 4, 30));
        assert!(db.request_recompute(&recompute).await.unwrap().ok);
        assert_eq!(db.report_chunk(&request).await.unwrap().len(), 30);
    }

    #[tokio::test]
    async fn recompute_validates_request() {
        let db = Database::new().unwrap();
        let plant = db.insert_plant("Alpha").unwrap();
        let inverted = RecomputeRequest::new(&plant.uid, ymd(2025, 4, 30), ymd(2025, 4, 1));
        assert!(matches!(
            db.request_recompute(&inverted).await,
            Err(ApiError::Validation(_))
        ));

        let unknown = RecomputeRequest::new("ghost", ymd(2025, 4, 1), ymd(2025, 4, 2));
        assert!(db.request_recompute(&unknown).await.unwrap_err().is_not_found());
        let chunk = ReportRequest::for_month("ghost", ymd(2025, 4, 1));
        assert!(db.report_chunk(&chunk).await.unwrap_err().is_not_found());
    }
}
