mod common;

use anyhow::Result;
use chrono::{TimeZone, Utc};

use hospital_api::client::{ApiClient, ClientError};
use hospital_api::database::models::{
    AppointmentListing, AppointmentStatus, NewDoctor, NewReport, NewUser, ReportType, Role,
};
use hospital_api::validation::AppointmentRequest;

fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "secret-password".to_string(),
        role,
        name: format!("{} Example", username),
        email: format!("{}@example.com", username),
        mobile: None,
    }
}

#[tokio::test]
async fn session_hooks_track_current_user() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = ApiClient::new(&server.base_url)?;

    assert!(client.user().await?.is_none());

    let user = client.register(&new_user("alice", Role::Patient)).await?;
    assert!(client.token().await.is_some());
    // Primed by register, served from cache
    assert_eq!(client.user().await?.map(|u| u.id), Some(user.id));

    client.logout().await?;
    assert!(client.token().await.is_none());
    assert!(client.user().await?.is_none());

    let again = client.login("alice", "secret-password").await?;
    assert_eq!(again.id, user.id);

    let err = client.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    Ok(())
}

#[tokio::test]
async fn mutations_invalidate_cached_lists() -> Result<()> {
    let server = common::spawn_server().await?;
    let admin = ApiClient::new(&server.base_url)?;
    admin.register(&new_user("root", Role::Admin)).await?;

    assert_eq!(admin.doctors().await?.len(), 3);
    assert!(admin.cache().contains("/api/doctors").await);

    let doctor = admin
        .create_doctor(&NewDoctor {
            name: "Dr. New".into(),
            specialization: "Dermatology".into(),
            bio: "Skin".into(),
            image_url: "https://images.example.com/new.jpg".into(),
            availability: "Mon 09:00-12:00".into(),
            experience: 4,
            rating: "4.5".into(),
        })
        .await?;
    assert!(!admin.cache().contains("/api/doctors").await);
    assert_eq!(admin.doctors().await?.len(), 4);
    assert_eq!(admin.doctor(doctor.id).await?.map(|d| d.name), Some("Dr. New".to_string()));
    assert!(admin.doctor(9999).await?.is_none());

    let booked = admin
        .book_appointment(&AppointmentRequest {
            patient_id: None,
            doctor_id: doctor.id,
            date: Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap(),
            reason: "Checkup".into(),
        })
        .await?;
    assert_eq!(booked.status, AppointmentStatus::Pending);

    let listing = admin.appointments().await?;
    assert!(matches!(listing, AppointmentListing::All(ref rows) if rows.len() == 1));

    admin
        .update_appointment_status(booked.id, AppointmentStatus::Completed)
        .await?;
    assert!(!admin.cache().contains("/api/appointments").await);
    let listing = admin.appointments().await?;
    assert_eq!(listing.appointments()[0].status, AppointmentStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn patient_hooks_see_own_data() -> Result<()> {
    let server = common::spawn_server().await?;
    let admin = ApiClient::new(&server.base_url)?;
    admin.register(&new_user("root", Role::Admin)).await?;
    let patient = ApiClient::new(&server.base_url)?;
    let me = patient.register(&new_user("alice", Role::Patient)).await?;

    assert!(patient.reports().await?.is_empty());
    assert!(matches!(patient.appointments().await?, AppointmentListing::Own(ref rows) if rows.is_empty()));
    assert!(matches!(admin.appointments().await?, AppointmentListing::All(ref rows) if rows.is_empty()));
    admin
        .create_report(&NewReport {
            patient_id: me.id,
            title: "X-ray left arm".into(),
            file_url: "https://files.example.com/xray.png".into(),
            report_type: ReportType::Xray,
        })
        .await?;
    // The patient's cached (empty) list is theirs to refresh
    patient.cache().invalidate("/api/reports").await;
    let reports = patient.reports().await?;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].report_type, ReportType::Xray);

    let doctor_id = patient.doctors().await?[0].id;
    patient
        .book_appointment(&AppointmentRequest {
            patient_id: None,
            doctor_id,
            date: Utc.with_ymd_and_hms(2030, 6, 1, 9, 30, 0).unwrap(),
            reason: "Rash".into(),
        })
        .await?;
    match patient.appointments().await? {
        AppointmentListing::Own(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].doctor.id, doctor_id);
        }
        other => panic!("expected patient listing, got {:?}", other),
    }

    let err = patient
        .update_appointment_status(1, AppointmentStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    Ok(())
}

#[tokio::test]
async fn validation_errors_carry_field_details() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = ApiClient::new(&server.base_url)?;

    let mut user = new_user("", Role::Patient);
    user.username = "   ".into();
    match client.register(&user).await {
        Err(ClientError::Api { status, field_errors, .. }) => {
            assert_eq!(status, 400);
            assert!(field_errors.contains_key("username"));
        }
        other => panic!("expected validation error, got {:?}", other.map(|u| u.id)),
    }
    Ok(())
}
