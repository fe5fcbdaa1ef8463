mod integration_tests {
    use crate::cli::commands::{companies, customers, import_django, init_database, users};
    use crate::test_utils::{account, init_test_tracing, json_fixture, setup_test_db};
    use model::entities::company::ExpertiseField;
    use model::entities::user::ProfileUpdate;
    use model::store;

    const DUMP: &str = r#"[
        {"model": "users.user", "pk": 3, "fields": {
            "password": "pbkdf2_sha256$600000$abc$def",
            "last_login": "2024-04-02T08:30:00Z",
            "is_superuser": false, "username": "fixit", "first_name": "Fix", "last_name": "It",
            "is_staff": false, "is_active": true, "date_joined": "2024-03-01T10:00:00.120Z",
            "is_company": true, "is_customer": false, "email": "fixit@example.com",
            "groups": [], "user_permissions": []}},
        {"model": "users.user", "pk": 5, "fields": {
            "password": "", "last_login": null, "username": "homeowner",
            "date_joined": "2024-03-02T11:00:00", "is_company": false, "is_customer": true,
            "email": "home@example.com"}},
        {"model": "users.company", "pk": 3, "fields": {"field": "Air Conditioner", "rating": 4}},
        {"model": "users.customer", "pk": 1, "fields": {}},
        {"model": "sessions.session", "pk": 9, "fields": {}}
    ]"#;

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let db = setup_test_db().await;
        init_database(&db).await.unwrap();
        init_database(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_and_show_company() {
        let _guard = init_test_tracing();
        let db = setup_test_db().await;

        let view = companies::register_company(&db, account("alice"), "Plumbing")
            .await
            .unwrap();
        assert_eq!(view.label, format!("{} - alice", view.user_id));
        assert_eq!(view.rating, 0);

        let shown = companies::show_company(&db, view.user_id).await.unwrap();
        assert_eq!(shown, view);

        let owner = store::get_user(&db, view.user_id).await.unwrap();
        assert!(owner.is_company);
        assert!(!owner.is_customer);
    }

    #[tokio::test]
    async fn test_register_company_rejects_unknown_field() {
        let db = setup_test_db().await;
        let err = companies::register_company(&db, account("alice"), "Roofing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Roofing"));
        assert!(store::find_user_by_email(&db, "alice@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_fails_on_second_user() {
        let db = setup_test_db().await;
        users::create_user(&db, account("alice"), false, false)
            .await
            .unwrap();

        let mut second = account("bob");
        second.email = "alice@example.com".to_string();
        let err = users::create_user(&db, second, false, true).await.unwrap_err();
        let model_err = err.downcast_ref::<model::ModelError>().unwrap();
        assert!(model_err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_set_rating_bounds() {
        let db = setup_test_db().await;
        let view = companies::register_company(&db, account("alice"), "Locks")
            .await
            .unwrap();

        for rating in 0..=5 {
            let updated = companies::set_rating(&db, view.user_id, rating).await.unwrap();
            assert_eq!(updated.rating, rating);
        }
        assert!(companies::set_rating(&db, view.user_id, -1).await.is_err());
        assert!(companies::set_rating(&db, view.user_id, 6).await.is_err());
        assert_eq!(
            companies::show_company(&db, view.user_id).await.unwrap().rating,
            5
        );
    }

    #[tokio::test]
    async fn test_list_companies_with_filter() {
        let db = setup_test_db().await;
        let a = companies::register_company(&db, account("a"), "Painting")
            .await
            .unwrap();
        let b = companies::register_company(&db, account("b"), "Gardening")
            .await
            .unwrap();
        companies::set_rating(&db, b.user_id, 5).await.unwrap();

        let all = companies::list_companies(&db, None).await.unwrap();
        assert_eq!(
            all.iter().map(|v| v.user_id).collect::<Vec<_>>(),
            vec![b.user_id, a.user_id]
        );

        let painting = companies::list_companies(&db, Some("Painting")).await.unwrap();
        assert_eq!(painting.len(), 1);
        assert_eq!(painting[0].username, "a");

        assert!(companies::list_companies(&db, Some("Roofing")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_user_removes_company() {
        let db = setup_test_db().await;
        let view = companies::register_company(&db, account("alice"), "Carpentry")
            .await
            .unwrap();

        assert!(users::delete_user(&db, view.user_id).await.unwrap());
        assert!(companies::show_company(&db, view.user_id).await.is_err());
        assert!(store::find_company(&db, view.user_id).await.unwrap().is_none());
        assert!(!users::delete_user(&db, view.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_customer_and_update_profile() {
        let db = setup_test_db().await;
        let mut args = account("carol");
        args.password = Some("correct horse".to_string());
        let (created, customer) = customers::register_customer(&db, args).await.unwrap();
        assert!(created.is_customer);
        assert!(customer.id > 0);
        assert!(created.check_password("correct horse"));

        let updated = users::update_user(
            &db,
            created.id,
            ProfileUpdate {
                is_company: Some(true),
                last_name: Some("Smith".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.is_company && updated.is_customer);
        assert_eq!(updated.last_name, "Smith");

        assert!(store::authenticate(&db, "carol", "correct horse")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_import_django_dump() {
        let db = setup_test_db().await;
        let fixture = json_fixture(DUMP);

        let summary = import_django(&db, fixture.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(summary.users, 2);
        assert_eq!(summary.companies, 1);
        assert_eq!(summary.customers, 1);
        assert_eq!(summary.skipped, 1);

        let fixit = store::find_user_by_email(&db, "fixit@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(fixit.is_company);
        assert_eq!(fixit.first_name, "Fix");
        assert!(fixit.last_login.is_some());
        assert_eq!(fixit.date_joined.to_rfc3339(), "2024-03-01T10:00:00.120+00:00");
        // Foreign password hashes cannot be verified and are left unusable
        assert!(fixit.password.starts_with('!'));

        let view = companies::show_company(&db, fixit.id).await.unwrap();
        assert_eq!(view.field, ExpertiseField::AirConditioner.as_str());
        assert_eq!(view.rating, 4);
        assert_eq!(view.label, format!("{} - fixit", fixit.id));

        let home = store::find_user_by_email(&db, "home@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(home.is_customer);
        assert!(home.is_active);
        assert!(store::find_company(&db, home.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_django_rolls_back_on_invalid_rating() {
        let db = setup_test_db().await;
        let fixture = json_fixture(
            r#"[
            {"model": "users.user", "pk": 1, "fields": {"username": "x", "email": "x@example.com"}},
            {"model": "users.company", "pk": 1, "fields": {"field": "Locks", "rating": 9}}
        ]"#,
        );

        let err = import_django(&db, fixture.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("rating"));
        assert!(store::find_user_by_email(&db, "x@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_import_django_requires_company_field() {
        let db = setup_test_db().await;
        let fixture = json_fixture(
            r#"[
            {"model": "users.user", "pk": 1, "fields": {"username": "x", "email": "x@example.com"}},
            {"model": "users.company", "pk": 1, "fields": {"rating": 2}}
        ]"#,
        );

        let err = import_django(&db, fixture.path().to_str().unwrap())
            .await
            .unwrap_err();
        let model_err = err.downcast_ref::<model::ModelError>().unwrap();
        assert!(matches!(
            model_err,
            model::ModelError::RequiredFieldMissing { field: "field" }
        ));
    }

    #[tokio::test]
    async fn test_import_django_keeps_argon2_passwords() {
        let db = setup_test_db().await;
        let hash = format!("argon2{}", model::auth::hash_password("s3cret").unwrap());
        let fixture = json_fixture(&format!(
            r#"[{{"model": "users.user", "pk": 1, "fields": {{
                "username": "argo", "email": "argo@example.com", "password": "{hash}"}}}}]"#
        ));

        import_django(&db, fixture.path().to_str().unwrap())
            .await
            .unwrap();

        let user = store::authenticate(&db, "argo", "s3cret").await.unwrap();
        assert!(user.is_some_and(|u| u.last_login.is_some()));
        assert!(store::authenticate(&db, "argo", "wrong")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_import_django_missing_file() {
        let db = setup_test_db().await;
        let err = import_django(&db, "/nonexistent/dump.json").await.unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }
}
