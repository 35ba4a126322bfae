#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use popmeet::config::SecurityConfig;
use popmeet::events::repo_types::{Event, EventRow, NewEvent};
use popmeet::reference::repo_types::{Interest, Language, LoginProvider};
use popmeet::repository::{ConstraintKind, RepoError, RepoResult, Repository};
use popmeet::state::AppState;
use popmeet::users::repo_types::{
    AgeRange, NewUser, Profile, ProfileRow, Security, SecurityRow, Sex, User, UserRow, UserUpdate,
};

pub const GOOGLE_PROVIDER_ID: i64 = 2;

#[derive(Debug, Clone, Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<i64, UserRow>,
    securities: BTreeMap<i64, (i64, SecurityRow)>,
    profiles: BTreeMap<i64, (i64, ProfileRow)>,
    profile_interests: BTreeMap<i64, BTreeSet<i64>>,
    events: BTreeMap<i64, EventRow>,
    attendees: BTreeMap<i64, Vec<i64>>,
    interests: BTreeMap<i64, Interest>,
    languages: BTreeMap<i64, Language>,
    providers: BTreeMap<i64, LoginProvider>,
}

impl Store {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_email_owner(&self, email: &str) -> Option<i64> {
        self.users
            .values()
            .find(|u| u.active && u.email == email)
            .map(|u| u.id)
    }
}

fn violation(kind: ConstraintKind, constraint: &str) -> RepoError {
    RepoError::ConstraintViolation {
        kind,
        constraint: Some(constraint.to_string()),
        detail: format!("violates {constraint}"),
    }
}

/// Repository double: every write works on a draft copy that replaces the
/// store only when all of its steps succeed.
pub struct InMemoryRepository {
    store: Mutex<Store>,
    fail_security_insert: AtomicBool,
    login_updates: Mutex<Vec<(i64, Option<String>)>>,
}

impl InMemoryRepository {
    pub fn seeded() -> Self {
        let now = OffsetDateTime::now_utc();
        let mut store = Store {
            next_id: 100,
            ..Store::default()
        };
        for (id, name) in [(1, "api"), (GOOGLE_PROVIDER_ID, "google")] {
            store.providers.insert(
                id,
                LoginProvider {
                    id,
                    name: name.into(),
                    web_clientid: None,
                    web_secret: None,
                    android_clientid: None,
                    android_secret: None,
                    iphone_clientid: None,
                    iphone_secret: None,
                    updated_at: now,
                },
            );
        }
        for (id, name, iso2, iso3) in [(1, "English", "en", "eng"), (2, "Spanish", "es", "spa")] {
            store.languages.insert(
                id,
                Language {
                    id,
                    name: name.into(),
                    name_iso2: iso2.into(),
                    name_iso3: iso3.into(),
                },
            );
        }
        for (id, name) in [(1, "Art"), (2, "Cinema"), (3, "Hiking"), (4, "Music")] {
            store.interests.insert(
                id,
                Interest {
                    id,
                    name: name.into(),
                },
            );
        }
        Self {
            store: Mutex::new(store),
            fail_security_insert: AtomicBool::new(false),
            login_updates: Mutex::new(Vec::new()),
        }
    }

    /// Makes the second statement of the user insert fail.
    pub fn fail_security_insert(&self, fail: bool) {
        self.fail_security_insert.store(fail, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn security_count(&self) -> usize {
        self.store.lock().unwrap().securities.len()
    }

    pub fn set_user_active(&self, id: i64, active: bool) {
        if let Some(u) = self.store.lock().unwrap().users.get_mut(&id) {
            u.active = active;
        }
    }

    pub fn set_event_active(&self, id: i64, active: bool) {
        if let Some(e) = self.store.lock().unwrap().events.get_mut(&id) {
            e.active = active;
        }
    }

    pub fn login_updates(&self) -> Vec<(i64, Option<String>)> {
        self.login_updates.lock().unwrap().clone()
    }

    fn profile_of(&self, store: &Store, user_id: i64) -> Option<(i64, ProfileRow)> {
        store
            .profiles
            .values()
            .find(|(owner, _)| *owner == user_id)
            .map(|(owner, row)| (*owner, row.clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn health(&self) -> RepoResult<()> {
        Ok(())
    }

    async fn find_interest_by_id(&self, id: i64) -> RepoResult<Interest> {
        let store = self.store.lock().unwrap();
        store
            .interests
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("interest", id))
    }

    async fn list_interests(&self) -> RepoResult<Vec<Interest>> {
        Ok(self.store.lock().unwrap().interests.values().cloned().collect())
    }

    async fn find_language_by_id(&self, id: i64) -> RepoResult<Language> {
        let store = self.store.lock().unwrap();
        store
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("language", id))
    }

    async fn list_languages(&self) -> RepoResult<Vec<Language>> {
        Ok(self.store.lock().unwrap().languages.values().cloned().collect())
    }

    async fn find_login_provider_by_id(&self, id: i64) -> RepoResult<LoginProvider> {
        let store = self.store.lock().unwrap();
        store
            .providers
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("login_provider", id))
    }

    async fn user_is_active(&self, id: i64) -> RepoResult<bool> {
        let store = self.store.lock().unwrap();
        Ok(store.users.get(&id).map(|u| u.active).unwrap_or(false))
    }

    async fn email_in_use(&self, email: &str) -> RepoResult<bool> {
        Ok(self.store.lock().unwrap().active_email_owner(email).is_some())
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .get(&id)
            .cloned()
            .map(User::from)
            .ok_or_else(|| RepoError::not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        let store = self.store.lock().unwrap();
        store
            .active_email_owner(email)
            .and_then(|id| store.users.get(&id).cloned())
            .map(User::from)
            .ok_or_else(|| RepoError::not_found("user", email))
    }

    async fn insert_user(&self, user: &NewUser) -> RepoResult<i64> {
        let mut store = self.store.lock().unwrap();
        let mut draft = store.clone();

        if draft.active_email_owner(&user.email).is_some() {
            return Err(violation(ConstraintKind::Unique, "users_active_email_key"));
        }
        let now = OffsetDateTime::now_utc();
        let user_id = draft.id();
        draft.users.insert(
            user_id,
            UserRow {
                id: user_id,
                email: user.email.clone(),
                name: user.name.clone(),
                created_at: now,
                updated_at: now,
                active: true,
            },
        );

        if self.fail_security_insert.load(Ordering::SeqCst) {
            return Err(RepoError::TransactionFailure {
                operation: "insert security",
                cause: sqlx::Error::Protocol("injected failure".into()),
            });
        }
        if !draft.providers.contains_key(&user.security.provider_id) {
            return Err(violation(ConstraintKind::ForeignKey, "user_security_fk_login_provider_fkey"));
        }
        let security_id = draft.id();
        draft.securities.insert(
            security_id,
            (
                user_id,
                SecurityRow {
                    id: security_id,
                    fk_login_provider: user.security.provider_id,
                    hash: user.security.hash.clone(),
                    last_machine: user.security.last_machine.clone(),
                    last_login_date: None,
                    updated_at: now,
                },
            ),
        );

        *store = draft;
        Ok(user_id)
    }

    async fn update_user(&self, update: &UserUpdate) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        let mut draft = store.clone();
        let now = OffsetDateTime::now_utc();

        if let Some(owner) = draft.active_email_owner(&update.email) {
            if owner != update.id {
                return Err(violation(ConstraintKind::Unique, "users_active_email_key"));
            }
        }
        let row = draft
            .users
            .get_mut(&update.id)
            .ok_or_else(|| RepoError::not_found("user", update.id))?;
        row.email = update.email.clone();
        row.name = update.name.clone();
        row.updated_at = now;

        if let Some(p) = &update.profile {
            if !draft.languages.contains_key(&p.language_id) {
                return Err(violation(ConstraintKind::ForeignKey, "user_profile_fk_language_fkey"));
            }
            let profile_id = if p.id <= 0 {
                if self.profile_of(&draft, update.id).is_some() {
                    return Err(violation(ConstraintKind::Unique, "user_profile_fk_user_key"));
                }
                let id = draft.id();
                draft.profiles.insert(
                    id,
                    (
                        update.id,
                        ProfileRow {
                            id,
                            fk_language: p.language_id,
                            age_range: p.age_range.as_str().into(),
                            sex: p.sex.as_str().into(),
                            updated_at: now,
                        },
                    ),
                );
                id
            } else {
                match draft.profiles.get_mut(&p.id) {
                    Some((owner, row)) if *owner == update.id => {
                        row.fk_language = p.language_id;
                        row.age_range = p.age_range.as_str().into();
                        row.sex = p.sex.as_str().into();
                        row.updated_at = now;
                    }
                    _ => return Err(RepoError::not_found("profile", p.id)),
                }
                p.id
            };
            if p.interest_ids.iter().any(|i| !draft.interests.contains_key(i)) {
                return Err(violation(ConstraintKind::ForeignKey, "users_profile_interests_fk_interest_fkey"));
            }
            draft
                .profile_interests
                .insert(profile_id, p.interest_ids.iter().copied().collect());
        }

        *store = draft;
        Ok(())
    }

    async fn find_profile_by_user_id(&self, user_id: i64) -> RepoResult<Profile> {
        let store = self.store.lock().unwrap();
        let (_, row) = self
            .profile_of(&store, user_id)
            .ok_or_else(|| RepoError::not_found("profile", user_id))?;
        let language = store
            .languages
            .get(&row.fk_language)
            .cloned()
            .ok_or_else(|| RepoError::not_found("language", row.fk_language))?;
        let interests = store
            .profile_interests
            .get(&row.id)
            .map(|ids| ids.iter().filter_map(|i| store.interests.get(i).cloned()).collect())
            .unwrap_or_default();
        Ok(Profile {
            id: row.id,
            language,
            sex: row.sex.parse::<Sex>().expect("stored sex"),
            age_range: row.age_range.parse::<AgeRange>().expect("stored age range"),
            updated_at: row.updated_at,
            interests,
        })
    }

    async fn find_security_by_user_id(&self, user_id: i64) -> RepoResult<Security> {
        let store = self.store.lock().unwrap();
        let row = store
            .securities
            .values()
            .find(|(owner, _)| *owner == user_id)
            .map(|(_, row)| row.clone())
            .ok_or_else(|| RepoError::not_found("security", user_id))?;
        let provider = store
            .providers
            .get(&row.fk_login_provider)
            .cloned()
            .ok_or_else(|| RepoError::not_found("login_provider", row.fk_login_provider))?;
        Ok(Security {
            id: row.id,
            provider,
            hash: row.hash,
            last_machine: row.last_machine,
            last_login: row.last_login_date,
            updated_at: row.updated_at,
        })
    }

    async fn update_login_data(&self, security_id: i64, origin: Option<&str>) -> RepoResult<()> {
        {
            let mut store = self.store.lock().unwrap();
            let (_, row) = store
                .securities
                .get_mut(&security_id)
                .ok_or_else(|| RepoError::not_found("security", security_id))?;
            row.last_login_date = Some(OffsetDateTime::now_utc());
            row.last_machine = origin.map(str::to_string);
        }
        self.login_updates
            .lock()
            .unwrap()
            .push((security_id, origin.map(str::to_string)));
        Ok(())
    }

    async fn event_is_active(&self, id: i64) -> RepoResult<bool> {
        let store = self.store.lock().unwrap();
        Ok(store.events.get(&id).map(|e| e.active).unwrap_or(false))
    }

    async fn find_event_by_id(&self, id: i64) -> RepoResult<Event> {
        let store = self.store.lock().unwrap();
        let row = store
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("event", id))?;
        let created_by = store
            .users
            .get(&row.fk_created_by)
            .cloned()
            .map(User::from)
            .ok_or_else(|| RepoError::not_found("user", row.fk_created_by))?;
        let attendees = store
            .attendees
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|u| store.users.get(u).cloned().map(User::from))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Event::from_row(row, created_by, attendees))
    }

    async fn insert_event(&self, event: &NewEvent) -> RepoResult<i64> {
        let mut store = self.store.lock().unwrap();
        if event.start_date >= event.end_date {
            return Err(violation(ConstraintKind::Check, "event_window_check"));
        }
        if !store.users.contains_key(&event.created_by) {
            return Err(violation(ConstraintKind::ForeignKey, "event_fk_created_by_fkey"));
        }
        let id = store.id();
        store.events.insert(
            id,
            EventRow {
                id,
                created_at: OffsetDateTime::now_utc(),
                start_date: event.start_date,
                end_date: event.end_date,
                location: event.location.clone(),
                longitude: event.longitude,
                latitude: event.latitude,
                active: event.active,
                fk_created_by: event.created_by,
            },
        );
        Ok(id)
    }

    async fn add_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        let creator = store
            .events
            .get(&event_id)
            .map(|e| e.fk_created_by)
            .ok_or_else(|| RepoError::not_found("event", event_id))?;
        if creator == user_id {
            return Err(RepoError::CannotAddCreatorAsAttendee);
        }
        let list = store.attendees.entry(event_id).or_default();
        if !list.contains(&user_id) {
            list.push(user_id);
        }
        Ok(())
    }

    async fn remove_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        let list = store.attendees.entry(event_id).or_default();
        match list.iter().position(|u| *u == user_id) {
            Some(idx) => {
                list.remove(idx);
                Ok(())
            }
            None => Err(RepoError::not_found(
                "event_attendee",
                format!("{event_id}:{user_id}"),
            )),
        }
    }
}

pub fn security_config() -> SecurityConfig {
    SecurityConfig {
        signing_key: "integration-test-key".into(),
        ttl_minutes: 10,
    }
}

/// State over a fresh seeded repository; the repository handle is returned
/// for direct inspection.
pub fn state() -> (AppState, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::seeded());
    let state = AppState::new(repo.clone(), security_config(), Duration::from_secs(2));
    (state, repo)
}
