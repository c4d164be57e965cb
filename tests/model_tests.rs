use chrono::Utc;
use mental_group::models::{
    CrimesResponse, PublicUser, UpdateProfileRequest, User, UserStatus,
};
use uuid::Uuid;

#[test]
fn public_user_serializes_camel_case_without_the_hash() {
    let user = User {
        id: Uuid::new_v4(),
        name: "A".to_string(),
        email: "a@x.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_string(),
        age: 20,
        profile_picture_url: Some("https://img.example/a.png".to_string()),
        role: Some("mental".to_string()),
        crimes: vec!["jaywalking".to_string()],
        status: UserStatus::Approved,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let public: PublicUser = user.into();
    let json = serde_json::to_value(&public).unwrap();

    // CRITICAL: the hash must not survive the projection under any name.
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password_hash").is_none());
    assert!(!json.to_string().contains("argon2"));

    // Wire format is camelCase for the frontend.
    assert_eq!(json["profilePictureUrl"], "https://img.example/a.png");
    assert!(json.get("createdAt").is_some());
    assert!(json.get("profile_picture_url").is_none());
}

#[test]
fn user_status_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&UserStatus::Pending).unwrap(),
        r#""pending""#
    );
    assert_eq!(
        serde_json::to_string(&UserStatus::Approved).unwrap(),
        r#""approved""#
    );
}

#[test]
fn update_profile_request_supports_partial_payloads() {
    // Only the provided fields appear in the serialized patch.
    let partial_update = UpdateProfileRequest {
        id: Uuid::new_v4(),
        name: Some("New Name Only".to_string()),
        ..UpdateProfileRequest::default()
    };

    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""name":"New Name Only""#));
    assert!(!json_output.contains("email"));
    assert!(!json_output.contains("password"));

    // And a sparse incoming body deserializes with everything else None.
    let parsed: UpdateProfileRequest = serde_json::from_str(&format!(
        r#"{{ "id": "{}", "age": 21 }}"#,
        Uuid::new_v4()
    ))
    .unwrap();
    assert_eq!(parsed.age, Some(21));
    assert!(parsed.name.is_none());
    assert!(parsed.role.is_none());
}

#[test]
fn crimes_response_omits_message_on_plain_reads() {
    let read = CrimesResponse {
        message: None,
        crimes: vec!["jaywalking".to_string()],
    };
    let json_output = serde_json::to_string(&read).unwrap();
    assert!(!json_output.contains("message"));

    let mutation = CrimesResponse {
        message: Some("Crime added successfully".to_string()),
        crimes: vec![],
    };
    let json_output = serde_json::to_string(&mutation).unwrap();
    assert!(json_output.contains("Crime added successfully"));
}
