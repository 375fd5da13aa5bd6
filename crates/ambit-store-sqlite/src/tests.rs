//! Integration tests for `SqliteStore` against an in-memory database.

use ambit_core::{
  actor::{Actor, RoleSet},
  assignment::{Assignment, AssignmentRole, AssignmentSpec, NewAssignment},
  client::{Client, ClientKind, ClientPatch, ContactInfo, GeoPoint, NewClient, Potential},
  scope::VisibilityScope,
  store::{ClientQuery, ClientStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn agent_actor() -> Actor {
  Actor::new(Uuid::new_v4(), RoleSet::from_codes(["agent"]).unwrap())
}

fn admin_actor() -> Actor {
  Actor::new(Uuid::new_v4(), RoleSet::from_codes(["admin"]).unwrap())
}

fn new_client(code: &str) -> NewClient {
  NewClient {
    code:      code.into(),
    name:      format!("Client {code}"),
    kind:      ClientKind::Pharmacy,
    potential: Potential::B,
    base_id:   Uuid::new_v4(),
    zone_id:   Uuid::new_v4(),
    contact:   ContactInfo::default(),
    location:  None,
  }
}

/// A client created by an admin: no auto-assigned edge.
async fn admin_client(s: &SqliteStore, code: &str) -> Client {
  s.create_client(new_client(code), admin_actor()).await.unwrap()
}

async fn attach(
  s: &SqliteStore,
  client_id: Uuid,
  user_id: Uuid,
  role: AssignmentRole,
) -> Assignment {
  s.attach_edge(client_id, NewAssignment::new(user_id, role, Uuid::new_v4()))
    .await
    .unwrap()
}

// ─── Client creation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_by_agent_auto_assigns_one_active_primary() {
  let s = store().await;
  let agent = agent_actor();

  let client = s
    .create_client(new_client("C-001"), agent.clone())
    .await
    .unwrap();
  assert_eq!(client.created_by, agent.actor_id);

  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  assert_eq!(edges.len(), 1);
  let edge = &edges[0];
  assert_eq!(edge.user_id, agent.actor_id);
  assert_eq!(edge.assigned_by, agent.actor_id);
  assert_eq!(edge.role, AssignmentRole::Primary);
  assert!(edge.active);
}

#[tokio::test]
async fn create_by_admin_does_not_auto_assign() {
  let s = store().await;
  let client = admin_client(&s, "C-002").await;

  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  assert!(edges.is_empty());
}

#[tokio::test]
async fn client_fields_roundtrip() {
  let s = store().await;
  let mut input = new_client("C-003");
  input.kind = ClientKind::Wholesaler;
  input.potential = Potential::A;
  input.contact = ContactInfo {
    contact_name: Some("Mme Diarra".into()),
    phone:        Some("+223 20 22 33 44".into()),
    email:        Some("diarra@example.com".into()),
    street:       Some("Rue 402".into()),
    city:         Some("Bamako".into()),
  };
  input.location = Some(GeoPoint { latitude: 12.6392, longitude: -8.0029 });

  let created = s.create_client(input, admin_actor()).await.unwrap();
  let fetched = s
    .get_client(created.client_id)
    .await
    .unwrap()
    .expect("client exists");

  assert_eq!(fetched.code, "C-003");
  assert_eq!(fetched.kind, ClientKind::Wholesaler);
  assert_eq!(fetched.potential, Potential::A);
  assert_eq!(fetched.contact.city.as_deref(), Some("Bamako"));
  assert_eq!(fetched.location.unwrap().latitude, 12.6392);
  assert!(fetched.active);
}

#[tokio::test]
async fn get_client_missing_returns_none() {
  let s = store().await;
  assert!(s.get_client(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Client update & lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn update_client_patches_only_given_fields() {
  let s = store().await;
  let client = admin_client(&s, "C-010").await;

  let patch = ClientPatch {
    name: Some("Renamed".into()),
    potential: Some(Potential::C),
    ..Default::default()
  };
  let updated = s.update_client(client.client_id, patch).await.unwrap();

  assert_eq!(updated.name, "Renamed");
  assert_eq!(updated.potential, Potential::C);
  assert_eq!(updated.code, client.code);
  assert_eq!(updated.kind, client.kind);
  assert!(updated.updated_at >= client.updated_at);
}

#[tokio::test]
async fn update_missing_client_errors() {
  let s = store().await;
  let err = s
    .update_client(Uuid::new_v4(), ClientPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::ClientNotFound(_))));
}

#[tokio::test]
async fn retire_hides_and_restore_returns() {
  let s = store().await;
  let client = admin_client(&s, "C-011").await;

  let retired = s.retire_client(client.client_id).await.unwrap();
  assert!(!retired.active);

  let visible = s
    .list_clients(&VisibilityScope::All, &ClientQuery::default())
    .await
    .unwrap();
  assert!(visible.iter().all(|c| c.client_id != client.client_id));

  let with_retired = s
    .list_clients(
      &VisibilityScope::All,
      &ClientQuery { include_retired: true, ..Default::default() },
    )
    .await
    .unwrap();
  assert!(with_retired.iter().any(|c| c.client_id == client.client_id));

  let restored = s.restore_client(client.client_id).await.unwrap();
  assert!(restored.active);
}

#[tokio::test]
async fn purge_removes_client_and_edge_history() {
  let s = store().await;
  let client = admin_client(&s, "C-012").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;

  s.purge_client(client.client_id).await.unwrap();

  assert!(s.get_client(client.client_id).await.unwrap().is_none());
  let edges = s.edges_for_user(user, true).await.unwrap();
  assert!(edges.is_empty());
}

#[tokio::test]
async fn purge_missing_client_errors() {
  let s = store().await;
  let err = s.purge_client(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::ClientNotFound(_))));
}

// ─── Attach ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn attach_persists_the_edge() {
  let s = store().await;
  let client = admin_client(&s, "C-020").await;
  let user = Uuid::new_v4();
  let by = Uuid::new_v4();

  let edge = s
    .attach_edge(
      client.client_id,
      NewAssignment::new(user, AssignmentRole::Secondary, by),
    )
    .await
    .unwrap();
  assert_eq!(edge.assigned_by, by);

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  assert_eq!(edges.len(), 1);
  assert_eq!(edges[0].user_id, user);
  assert_eq!(edges[0].role, AssignmentRole::Secondary);
}

#[tokio::test]
async fn attach_existing_pair_errors_even_when_inactive() {
  let s = store().await;
  let client = admin_client(&s, "C-021").await;
  let user = Uuid::new_v4();
  let other = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;
  attach(&s, client.client_id, other, AssignmentRole::Secondary).await;

  s.deactivate_edge(client.client_id, user).await.unwrap();

  // Strict create: the historical row still occupies the pair.
  let err = s
    .attach_edge(
      client.client_id,
      NewAssignment::new(user, AssignmentRole::Secondary, Uuid::new_v4()),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::DuplicateEdge { .. })));
}

#[tokio::test]
async fn attach_second_active_primary_errors() {
  let s = store().await;
  let client = admin_client(&s, "C-022").await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;

  let err = s
    .attach_edge(
      client.client_id,
      NewAssignment::new(
        Uuid::new_v4(),
        AssignmentRole::Primary,
        Uuid::new_v4(),
      ),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::DuplicatePrimary(_))));
}

#[tokio::test]
async fn attach_to_missing_client_errors() {
  let s = store().await;
  let err = s
    .attach_edge(
      Uuid::new_v4(),
      NewAssignment::new(
        Uuid::new_v4(),
        AssignmentRole::Primary,
        Uuid::new_v4(),
      ),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::ClientNotFound(_))));
}

// ─── Sync ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_replaces_the_entire_edge_set() {
  let s = store().await;
  let client = admin_client(&s, "C-030").await;
  let old_user = Uuid::new_v4();
  attach(&s, client.client_id, old_user, AssignmentRole::Primary).await;

  let kept = Uuid::new_v4();
  let added = Uuid::new_v4();
  let specs = vec![
    AssignmentSpec::new(kept, AssignmentRole::Primary),
    AssignmentSpec::new(added, AssignmentRole::Secondary),
  ];
  s.sync_assignments(client.client_id, specs, Uuid::new_v4())
    .await
    .unwrap();

  // Exactly the desired set — the old edge is gone, history included.
  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  assert_eq!(edges.len(), 2);
  let users: Vec<Uuid> = edges.iter().map(|e| e.user_id).collect();
  assert!(users.contains(&kept));
  assert!(users.contains(&added));
  assert!(!users.contains(&old_user));
}

#[tokio::test]
async fn sync_is_idempotent() {
  let s = store().await;
  let client = admin_client(&s, "C-031").await;
  let user = Uuid::new_v4();
  let specs = vec![AssignmentSpec::new(user, AssignmentRole::Primary)];

  s.sync_assignments(client.client_id, specs.clone(), Uuid::new_v4())
    .await
    .unwrap();
  s.sync_assignments(client.client_id, specs, Uuid::new_v4())
    .await
    .unwrap();

  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  assert_eq!(edges.len(), 1);
  assert_eq!(edges[0].user_id, user);
}

#[tokio::test]
async fn sync_rejects_a_set_without_an_active_edge() {
  let s = store().await;
  let client = admin_client(&s, "C-032").await;

  let specs =
    vec![AssignmentSpec::inactive(Uuid::new_v4(), AssignmentRole::Primary)];
  let err = s
    .sync_assignments(client.client_id, specs, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ambit_core::Error::LastActiveAssignment(_))
  ));
}

#[tokio::test]
async fn sync_missing_client_errors() {
  let s = store().await;
  let specs = vec![AssignmentSpec::new(Uuid::new_v4(), AssignmentRole::Primary)];
  let err = s
    .sync_assignments(Uuid::new_v4(), specs, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::ClientNotFound(_))));
}

// ─── Merge (sync without detaching) ──────────────────────────────────────────

#[tokio::test]
async fn merge_never_removes_unmentioned_edges() {
  let s = store().await;
  let client = admin_client(&s, "C-040").await;
  let existing = Uuid::new_v4();
  attach(&s, client.client_id, existing, AssignmentRole::Primary).await;

  let added = Uuid::new_v4();
  s.merge_assignments(
    client.client_id,
    vec![AssignmentSpec::new(added, AssignmentRole::Secondary)],
    Uuid::new_v4(),
  )
  .await
  .unwrap();

  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  assert_eq!(edges.len(), 2);
  let users: Vec<Uuid> = edges.iter().map(|e| e.user_id).collect();
  assert!(users.contains(&existing));
  assert!(users.contains(&added));
}

#[tokio::test]
async fn merge_entries_win_on_conflicting_fields() {
  let s = store().await;
  let client = admin_client(&s, "C-041").await;
  let user = Uuid::new_v4();
  let other = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;
  attach(&s, client.client_id, other, AssignmentRole::Secondary).await;

  let by = Uuid::new_v4();
  s.merge_assignments(
    client.client_id,
    vec![AssignmentSpec::new(user, AssignmentRole::Secondary)],
    by,
  )
  .await
  .unwrap();

  let edges = s.edges_for_client(client.client_id, true).await.unwrap();
  let edge = edges.iter().find(|e| e.user_id == user).unwrap();
  assert_eq!(edge.role, AssignmentRole::Secondary);
  assert_eq!(edge.assigned_by, by);
}

#[tokio::test]
async fn merge_can_hand_over_primary_in_one_call() {
  let s = store().await;
  let client = admin_client(&s, "C-042").await;
  let old_primary = Uuid::new_v4();
  attach(&s, client.client_id, old_primary, AssignmentRole::Primary).await;

  let new_primary = Uuid::new_v4();
  s.merge_assignments(
    client.client_id,
    vec![
      AssignmentSpec::new(new_primary, AssignmentRole::Primary),
      AssignmentSpec::new(old_primary, AssignmentRole::Secondary),
    ],
    Uuid::new_v4(),
  )
  .await
  .unwrap();

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  let primaries: Vec<&Assignment> =
    edges.iter().filter(|e| e.role.is_primary()).collect();
  assert_eq!(primaries.len(), 1);
  assert_eq!(primaries[0].user_id, new_primary);
}

#[tokio::test]
async fn merge_rejects_a_second_active_primary() {
  let s = store().await;
  let client = admin_client(&s, "C-043").await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;

  let err = s
    .merge_assignments(
      client.client_id,
      vec![AssignmentSpec::new(Uuid::new_v4(), AssignmentRole::Primary)],
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::DuplicatePrimary(_))));
}

#[tokio::test]
async fn merge_cannot_deactivate_the_last_active_edge() {
  let s = store().await;
  let client = admin_client(&s, "C-044").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;

  let err = s
    .merge_assignments(
      client.client_id,
      vec![AssignmentSpec::inactive(user, AssignmentRole::Primary)],
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ambit_core::Error::LastActiveAssignment(_))
  ));
}

// ─── Role updates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_edge_role_changes_role_in_place() {
  let s = store().await;
  let client = admin_client(&s, "C-050").await;
  let user = Uuid::new_v4();
  let original =
    attach(&s, client.client_id, user, AssignmentRole::Primary).await;

  let updated = s
    .update_edge_role(client.client_id, user, AssignmentRole::Secondary)
    .await
    .unwrap();
  assert_eq!(updated.role, AssignmentRole::Secondary);
  // Provenance is untouched by a pure role flip.
  assert_eq!(updated.assigned_by, original.assigned_by);
  assert_eq!(updated.assigned_at, original.assigned_at);
}

#[tokio::test]
async fn update_edge_role_missing_pair_errors() {
  let s = store().await;
  let client = admin_client(&s, "C-051").await;

  let err = s
    .update_edge_role(client.client_id, Uuid::new_v4(), AssignmentRole::Primary)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::EdgeNotFound { .. })));
}

#[tokio::test]
async fn update_edge_role_rejects_a_second_active_primary() {
  let s = store().await;
  let client = admin_client(&s, "C-052").await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;

  let err = s
    .update_edge_role(client.client_id, user, AssignmentRole::Primary)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::DuplicatePrimary(_))));
}

// ─── Deactivate / detach ─────────────────────────────────────────────────────

#[tokio::test]
async fn deactivate_preserves_the_edge_for_history() {
  let s = store().await;
  let client = admin_client(&s, "C-060").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;

  let edge = s.deactivate_edge(client.client_id, user).await.unwrap();
  assert!(!edge.active);

  let active = s.edges_for_client(client.client_id, false).await.unwrap();
  assert!(active.iter().all(|e| e.user_id != user));

  let all = s.edges_for_client(client.client_id, true).await.unwrap();
  let historical = all.iter().find(|e| e.user_id == user).unwrap();
  assert!(!historical.active);
}

#[tokio::test]
async fn deactivate_last_active_edge_errors() {
  let s = store().await;
  let client = admin_client(&s, "C-061").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;

  let err = s.deactivate_edge(client.client_id, user).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ambit_core::Error::LastActiveAssignment(_))
  ));
}

#[tokio::test]
async fn deactivate_missing_pair_errors() {
  let s = store().await;
  let client = admin_client(&s, "C-062").await;
  let err = s
    .deactivate_edge(client.client_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ambit_core::Error::EdgeNotFound { .. })));
}

#[tokio::test]
async fn detach_erases_the_edge_including_history() {
  let s = store().await;
  let client = admin_client(&s, "C-063").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;

  s.detach_edge(client.client_id, user).await.unwrap();

  let all = s.edges_for_client(client.client_id, true).await.unwrap();
  assert!(all.iter().all(|e| e.user_id != user));
}

#[tokio::test]
async fn detach_last_active_edge_errors() {
  let s = store().await;
  let client = admin_client(&s, "C-064").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Primary).await;

  let err = s.detach_edge(client.client_id, user).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ambit_core::Error::LastActiveAssignment(_))
  ));
}

#[tokio::test]
async fn detach_an_inactive_edge_is_allowed() {
  let s = store().await;
  let client = admin_client(&s, "C-065").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;
  s.deactivate_edge(client.client_id, user).await.unwrap();

  s.detach_edge(client.client_id, user).await.unwrap();
  let all = s.edges_for_client(client.client_id, true).await.unwrap();
  assert_eq!(all.len(), 1);
}

// ─── Promote ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn promote_creates_the_edge_when_absent() {
  let s = store().await;
  let client = admin_client(&s, "C-070").await;
  let user = Uuid::new_v4();
  let by = Uuid::new_v4();

  let edge = s
    .promote_to_primary(client.client_id, user, by)
    .await
    .unwrap();
  assert_eq!(edge.role, AssignmentRole::Primary);
  assert_eq!(edge.assigned_by, by);
  assert!(edge.active);

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  assert_eq!(edges.len(), 1);
}

#[tokio::test]
async fn promote_leaves_exactly_one_active_primary() {
  let s = store().await;
  let client = admin_client(&s, "C-071").await;
  let old_primary = Uuid::new_v4();
  let user = Uuid::new_v4();
  attach(&s, client.client_id, old_primary, AssignmentRole::Primary).await;
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;

  s.promote_to_primary(client.client_id, user, Uuid::new_v4())
    .await
    .unwrap();

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  let primaries: Vec<&Assignment> =
    edges.iter().filter(|e| e.role.is_primary()).collect();
  assert_eq!(primaries.len(), 1);
  assert_eq!(primaries[0].user_id, user);

  let demoted = edges.iter().find(|e| e.user_id == old_primary).unwrap();
  assert_eq!(demoted.role, AssignmentRole::Secondary);
}

#[tokio::test]
async fn promote_reactivates_a_deactivated_edge() {
  let s = store().await;
  let client = admin_client(&s, "C-072").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;
  s.deactivate_edge(client.client_id, user).await.unwrap();

  s.promote_to_primary(client.client_id, user, Uuid::new_v4())
    .await
    .unwrap();

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  let edge = edges.iter().find(|e| e.user_id == user).unwrap();
  assert!(edge.active);
  assert!(edge.role.is_primary());
}

#[tokio::test]
async fn promote_is_idempotent() {
  let s = store().await;
  let client = admin_client(&s, "C-073").await;
  let user = Uuid::new_v4();

  s.promote_to_primary(client.client_id, user, Uuid::new_v4())
    .await
    .unwrap();
  s.promote_to_primary(client.client_id, user, Uuid::new_v4())
    .await
    .unwrap();

  let edges = s.edges_for_client(client.client_id, false).await.unwrap();
  assert_eq!(edges.len(), 1);
  assert!(edges[0].role.is_primary());
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn agent_scope_returns_only_active_assigned_clients() {
  let s = store().await;
  let agent = Uuid::new_v4();

  let a = admin_client(&s, "V-001").await;
  let b = admin_client(&s, "V-002").await;
  let c = admin_client(&s, "V-003").await;
  admin_client(&s, "V-004").await; // unrelated

  attach(&s, a.client_id, agent, AssignmentRole::Primary).await;
  attach(&s, b.client_id, agent, AssignmentRole::Secondary).await;
  attach(&s, c.client_id, agent, AssignmentRole::Secondary).await;
  attach(&s, c.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;
  s.deactivate_edge(c.client_id, agent).await.unwrap();

  let visible = s
    .list_clients(&VisibilityScope::Assigned(agent), &ClientQuery::default())
    .await
    .unwrap();

  let ids: Vec<Uuid> = visible.iter().map(|c| c.client_id).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&a.client_id));
  assert!(ids.contains(&b.client_id));
}

#[tokio::test]
async fn full_access_scope_returns_all_clients() {
  let s = store().await;
  admin_client(&s, "V-010").await;
  admin_client(&s, "V-011").await;
  admin_client(&s, "V-012").await;

  let visible = s
    .list_clients(&VisibilityScope::All, &ClientQuery::default())
    .await
    .unwrap();
  assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn base_scope_filters_on_home_base() {
  let s = store().await;
  let base = Uuid::new_v4();

  let mut inside = new_client("V-020");
  inside.base_id = base;
  let inside = s.create_client(inside, admin_actor()).await.unwrap();
  admin_client(&s, "V-021").await; // other base

  let visible = s
    .list_clients(
      &VisibilityScope::Bases(vec![base]),
      &ClientQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].client_id, inside.client_id);

  let none = s
    .list_clients(&VisibilityScope::Bases(vec![]), &ClientQuery::default())
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn nothing_scope_returns_no_clients() {
  let s = store().await;
  admin_client(&s, "V-030").await;

  let visible = s
    .list_clients(&VisibilityScope::Nothing, &ClientQuery::default())
    .await
    .unwrap();
  assert!(visible.is_empty());
}

// ─── Query filters ───────────────────────────────────────────────────────────

#[tokio::test]
async fn text_filter_matches_code_name_and_contact() {
  let s = store().await;
  let mut named = new_client("Q-001");
  named.name = "Pharmacie du Fleuve".into();
  s.create_client(named, admin_actor()).await.unwrap();
  admin_client(&s, "Q-002").await;

  let hits = s
    .list_clients(
      &VisibilityScope::All,
      &ClientQuery { text: Some("Fleuve".into()), ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].code, "Q-001");
}

#[tokio::test]
async fn kind_and_assigned_to_filters_compose_with_scope() {
  let s = store().await;
  let agent = Uuid::new_v4();

  let mut wholesale = new_client("Q-010");
  wholesale.kind = ClientKind::Wholesaler;
  let wholesale = s.create_client(wholesale, admin_actor()).await.unwrap();
  let pharmacy = admin_client(&s, "Q-011").await;

  attach(&s, wholesale.client_id, agent, AssignmentRole::Primary).await;
  attach(&s, pharmacy.client_id, agent, AssignmentRole::Secondary).await;

  let hits = s
    .list_clients(
      &VisibilityScope::Assigned(agent),
      &ClientQuery {
        kind: Some(ClientKind::Wholesaler),
        assigned_to: Some(agent),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].client_id, wholesale.client_id);
}

#[tokio::test]
async fn updated_after_filter_excludes_stale_clients() {
  let s = store().await;
  let old = admin_client(&s, "Q-020").await;
  let cutoff = old.updated_at + chrono::Duration::seconds(1);

  let hits = s
    .list_clients(
      &VisibilityScope::All,
      &ClientQuery { updated_after: Some(cutoff), ..Default::default() },
    )
    .await
    .unwrap();
  assert!(hits.is_empty());
}

// ─── Edge reads & base membership ────────────────────────────────────────────

#[tokio::test]
async fn active_edge_exists_tracks_deactivation() {
  let s = store().await;
  let client = admin_client(&s, "E-001").await;
  let user = Uuid::new_v4();
  attach(&s, client.client_id, user, AssignmentRole::Secondary).await;
  attach(&s, client.client_id, Uuid::new_v4(), AssignmentRole::Primary).await;

  assert!(s.active_edge_exists(client.client_id, user).await.unwrap());

  s.deactivate_edge(client.client_id, user).await.unwrap();
  assert!(!s.active_edge_exists(client.client_id, user).await.unwrap());
}

#[tokio::test]
async fn edges_for_user_spans_clients() {
  let s = store().await;
  let user = Uuid::new_v4();
  let a = admin_client(&s, "E-010").await;
  let b = admin_client(&s, "E-011").await;
  attach(&s, a.client_id, user, AssignmentRole::Primary).await;
  attach(&s, b.client_id, user, AssignmentRole::Secondary).await;

  let edges = s.edges_for_user(user, false).await.unwrap();
  assert_eq!(edges.len(), 2);
}

#[tokio::test]
async fn set_managed_bases_replaces_the_membership() {
  let s = store().await;
  let manager = Uuid::new_v4();
  let first = Uuid::new_v4();
  let second = Uuid::new_v4();

  s.set_managed_bases(manager, vec![first]).await.unwrap();
  assert_eq!(s.managed_bases(manager).await.unwrap(), vec![first]);

  s.set_managed_bases(manager, vec![second]).await.unwrap();
  let bases = s.managed_bases(manager).await.unwrap();
  assert_eq!(bases, vec![second]);
}
