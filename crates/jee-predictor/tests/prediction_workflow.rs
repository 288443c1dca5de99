//! End-to-end checks for the prediction workflow.
//!
//! Scenarios run through the public engine, session and HTTP router against
//! the embedded reference data and against data directories built on disk.

mod common {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use jee_predictor::config::PredictionSettings;
    use jee_predictor::prediction::PredictionEngine;
    use jee_predictor::reference::{load_reference, LoadedReference, ReferenceData};

    pub(super) fn engine() -> Arc<PredictionEngine> {
        engine_with(PredictionSettings::default())
    }

    pub(super) fn engine_with(settings: PredictionSettings) -> Arc<PredictionEngine> {
        Arc::new(PredictionEngine::new(
            Arc::new(ReferenceData::embedded()),
            &settings,
        ))
    }

    pub(super) fn shipped_data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    pub(super) fn load_dir(dir: &Path) -> LoadedReference {
        load_reference(Some(dir))
    }
}

mod pipeline {
    use super::common;
    use jee_predictor::colleges::{ChanceTier, InstitutionClass};
    use jee_predictor::config::PredictionSettings;
    use jee_predictor::estimation::Category;
    use jee_predictor::prediction::{PredictionError, PredictionRequest};

    #[test]
    fn topper_is_shortlisted_for_the_most_selective_programmes() {
        let result = common::engine()
            .predict(&PredictionRequest::from_total(280.0))
            .expect("valid request");

        assert_eq!(result.rank, 700);
        assert!(result.eligibility.eligible);
        assert_eq!(result.colleges.len(), 8);
        assert!(result
            .colleges
            .iter()
            .all(|college| college.chance == ChanceTier::Safe));
        assert_eq!(result.colleges[0].institution, "NIT Tiruchirappalli");
        assert_eq!(result.colleges[0].closing_rank, 1_200);
    }

    #[test]
    fn home_state_candidate_gets_state_quota_cutoff() {
        let engine = common::engine_with(PredictionSettings {
            top_n: 50,
            ..PredictionSettings::default()
        });
        let request = PredictionRequest::from_total(240.0).with_home_state("tamil nadu");
        let result = engine.predict(&request).expect("valid request");

        let trichy = result
            .colleges
            .iter()
            .find(|college| {
                college.institution == "NIT Tiruchirappalli"
                    && college.branch == "Computer Science and Engineering"
            })
            .expect("home-state seat reachable");
        assert!(trichy.home_state_quota);
        assert_eq!(trichy.closing_rank, 2_900);
        assert_eq!(trichy.chance, ChanceTier::Risky);
    }

    #[test]
    fn reserved_candidate_competes_in_category_column() {
        let request = PredictionRequest::from_total(200.0).with_category(Category::Sc);
        let result = common::engine().predict(&request).expect("valid request");

        assert_eq!(result.category_rank, 2_100);
        assert!(result
            .colleges
            .iter()
            .any(|college| college.seat_category == Category::Sc));
        assert!(result
            .colleges
            .iter()
            .all(|college| college.rank_ratio <= 1.5));
    }

    #[test]
    fn iiits_appear_alongside_nits() {
        let result = common::engine()
            .predict(&PredictionRequest::from_total(215.0))
            .expect("valid request");
        assert!(result
            .colleges
            .iter()
            .any(|college| college.class == InstitutionClass::Iiit));
    }

    #[test]
    fn top_n_setting_limits_shortlist() {
        let engine = common::engine_with(PredictionSettings {
            top_n: 3,
            ..PredictionSettings::default()
        });
        let result = engine
            .predict(&PredictionRequest::from_total(280.0))
            .expect("valid request");
        assert_eq!(result.colleges.len(), 3);
    }

    #[test]
    fn invalid_request_reports_field() {
        let error = common::engine()
            .predict(&PredictionRequest::from_subjects(90.0, 90.0, 100.5))
            .expect_err("mathematics out of range");
        assert!(matches!(
            error,
            PredictionError::MarksOutOfRange {
                field: "mathematics",
                ..
            }
        ));
    }
}

mod data_directory {
    use super::common;
    use jee_predictor::config::PredictionSettings;
    use jee_predictor::prediction::{PredictionEngine, PredictionRequest};
    use jee_predictor::reference::DataSet;
    use std::fs;
    use std::sync::Arc;

    #[test]
    fn session_tables_and_csv_import_flow_into_predictions() {
        let dir = tempfile::tempdir().expect("tempdir");
        for set in [
            DataSet::PercentileRank,
            DataSet::Categories,
            DataSet::NitCutoffs,
            DataSet::IiitCutoffs,
        ] {
            fs::copy(
                common::shipped_data_dir().join(set.file_name()),
                dir.path().join(set.file_name()),
            )
            .expect("copy shipped file");
        }
        fs::write(
            dir.path().join("percentile.json"),
            r#"{
                "version": "sessions-2025",
                "default": [
                    {"input": 300.0, "output": 100.0},
                    {"input": 0.0, "output": 0.0}
                ],
                "sessions": {
                    "jan": [
                        {"input": 300.0, "output": 100.0},
                        {"input": 150.0, "output": 98.0},
                        {"input": 0.0, "output": 0.0}
                    ]
                }
            }"#,
        )
        .expect("write sessions");
        fs::write(
            dir.path().join("cutoffs.csv"),
            "Institution,Class,Branch,Location,State,Category,Quota,Closing Rank,Closing Marks\n\
             NIT Goa,NIT,Computer Science and Engineering,Farmagudi,Goa,General,OS,,150\n",
        )
        .expect("write csv");

        let loaded = common::load_dir(dir.path());
        assert!(loaded.fallbacks.is_empty(), "{:?}", loaded.fallbacks);
        assert_eq!(loaded.summary().imported_records, 1);

        let engine = PredictionEngine::new(Arc::new(loaded.data), &PredictionSettings::default());

        let shift = engine
            .predict(&PredictionRequest::from_total(150.0).with_session("JAN-S2"))
            .expect("valid request");
        assert_eq!(shift.session_table.as_deref(), Some("jan"));
        assert_eq!(shift.percentile, 98.0);

        let default = engine
            .predict(&PredictionRequest::from_total(150.0))
            .expect("valid request");
        assert_eq!(default.session_table, None);
        assert_eq!(default.percentile, 50.0);

        // Closing marks of 150 resolve through the default table: 50th percentile.
        let goa = default
            .colleges
            .iter()
            .chain(&shift.colleges)
            .find(|college| college.institution == "NIT Goa");
        assert!(goa.is_some());
    }
}

mod routing {
    use super::common;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use jee_predictor::prediction::prediction_router;
    use jee_predictor::reference::ReferenceData;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn predict_endpoint_returns_ranked_colleges() {
        let app = prediction_router(common::engine(), ReferenceData::embedded().summary());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{
                            "marks": {"kind": "subjects", "physics": 85, "chemistry": 80, "mathematics": 85},
                            "category": "obc",
                            "session": "jan"
                        }"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(body["rank"], 2_800);
        assert_eq!(body["category_rank"], 756);
        assert_eq!(body["session"], "jan");
        assert!(body["session_table"].is_null());
        assert!(body["subject_percentiles"]["physics"].as_f64().is_some());
        let colleges = body["colleges"].as_array().expect("colleges array");
        assert!(!colleges.is_empty());
        assert_eq!(colleges[0]["chance"], "safe");
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let app = prediction_router(common::engine(), ReferenceData::embedded().summary());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"marks": {"kind": "total"}}"#))
                    .expect("request"),
            )
            .await
            .expect("router responds");

        assert!(response.status().is_client_error());
    }
}
