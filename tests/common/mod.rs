#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::Layer;

use link_tracker::application::services::{
    AuthService, CampaignService, ClickResolver, LinkService,
};
use link_tracker::domain::classifier::ClientClassifier;
use link_tracker::domain::entities::{
    CallerIdentity, Campaign, CampaignPatch, CampaignStatus, LinkPatch, LinkStatus, NewCampaign,
    NewTrackingEvent, NewTrackingLink, Restrictions, Role, TrackingEvent, TrackingLink,
};
use link_tracker::domain::geo::{GeoInfo, GeoLocator};
use link_tracker::domain::repositories::{
    CampaignRepository, ClickRecord, EventRepository, LinkRepository, Session, SessionRepository,
    UserAccount,
};
use link_tracker::error::AppError;
use link_tracker::routes::build_router;
use link_tracker::state::AppState;
use link_tracker::utils::token::hash_session_token;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const ADMIN_TOKEN: &str = "admin-bearer-token";
pub const ALICE_TOKEN: &str = "alice-bearer-token";
pub const BOB_TOKEN: &str = "bob-bearer-token";

pub const ADMIN_ID: i64 = 1;
pub const ALICE_ID: i64 = 2;
pub const BOB_ID: i64 = 3;

/// In-memory link, campaign and event store.
///
/// `record_click` runs the limit check and the increment under one lock, so
/// it has the same all-or-nothing behavior as the PostgreSQL transaction.
#[derive(Default)]
pub struct InMemoryStore {
    links: Mutex<Vec<TrackingLink>>,
    campaigns: Mutex<Vec<Campaign>>,
    events: Mutex<Vec<TrackingEvent>>,
    fail_writes: AtomicBool,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every subsequent `record_click` fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Makes the health probe fail.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn link(&self, id: i64) -> TrackingLink {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .expect("link exists")
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Inserts a link directly, bypassing service validation.
    pub fn insert(&self, link: TrackingLink) -> TrackingLink {
        let mut links = self.links.lock().unwrap();
        let mut link = link;
        link.id = links.len() as i64 + 1;
        links.push(link.clone());
        link
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn create(&self, new_link: NewTrackingLink) -> Result<TrackingLink, AppError> {
        let mut links = self.links.lock().unwrap();

        if links.iter().any(|l| l.token == new_link.token) {
            return Err(AppError::conflict("Unique constraint violation", json!({})));
        }

        let link = TrackingLink {
            id: links.len() as i64 + 1,
            token: new_link.token,
            destination_url: new_link.destination_url,
            owner_id: new_link.owner_id,
            campaign_id: new_link.campaign_id,
            recipient_email: new_link.recipient_email,
            recipient_name: new_link.recipient_name,
            status: LinkStatus::Active,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            click_limit: new_link.click_limit,
            click_count: 0,
            last_clicked: None,
            custom_message: new_link.custom_message,
            redirect_delay: new_link.redirect_delay,
            access_password_hash: new_link.access_password_hash,
            restrictions: new_link.restrictions,
        };
        links.push(link.clone());

        Ok(link)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TrackingLink>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links.iter().find(|l| l.token == token).cloned())
    }

    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<TrackingLink>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .find(|l| l.id == id && in_scope(l, owner_scope))
            .cloned())
    }

    async fn list(
        &self,
        owner_scope: Option<i64>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingLink>, AppError> {
        let links = self.links.lock().unwrap();

        let mut visible: Vec<TrackingLink> = links
            .iter()
            .filter(|l| in_scope(l, owner_scope))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(visible
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect())
    }

    async fn count(&self, owner_scope: Option<i64>) -> Result<i64, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links.iter().filter(|l| in_scope(l, owner_scope)).count() as i64)
    }

    async fn update(
        &self,
        id: i64,
        owner_scope: Option<i64>,
        patch: LinkPatch,
    ) -> Result<TrackingLink, AppError> {
        let mut links = self.links.lock().unwrap();

        let link = links
            .iter_mut()
            .find(|l| l.id == id && in_scope(l, owner_scope))
            .ok_or_else(|| AppError::not_found("Tracking link not found", json!({ "id": id })))?;
        patch.apply_to(link);

        Ok(link.clone())
    }

    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| !(l.id == id && in_scope(l, owner_scope)));
        Ok(links.len() < before)
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::internal("Database error", json!({})));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn record_click(
        &self,
        link: &TrackingLink,
        event: NewTrackingEvent,
    ) -> Result<ClickRecord, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal("Database error", json!({})));
        }

        let mut links = self.links.lock().unwrap();
        let Some(stored) = links.iter_mut().find(|l| l.id == link.id) else {
            return Ok(ClickRecord::LimitReached);
        };

        if stored.click_limit > 0 && stored.click_count >= stored.click_limit {
            return Ok(ClickRecord::LimitReached);
        }
        stored.click_count += 1;
        stored.last_clicked = Some(event.timestamp);

        let mut events = self.events.lock().unwrap();
        let recorded = event.into_event(events.len() as i64 + 1);
        events.push(recorded.clone());

        Ok(ClickRecord::Recorded(recorded))
    }

    async fn list_by_token(&self, token: &str, limit: i64) -> Result<Vec<TrackingEvent>, AppError> {
        let events = self.events.lock().unwrap();

        let mut matching: Vec<TrackingEvent> =
            events.iter().filter(|e| e.token == token).cloned().collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        matching.truncate(limit as usize);

        Ok(matching)
    }
}

#[async_trait]
impl CampaignRepository for InMemoryStore {
    async fn create(&self, new_campaign: NewCampaign) -> Result<Campaign, AppError> {
        let mut campaigns = self.campaigns.lock().unwrap();

        let campaign = Campaign {
            id: campaigns.iter().map(|c| c.id).max().unwrap_or(0) + 1,
            name: new_campaign.name,
            description: new_campaign.description,
            owner_id: new_campaign.owner_id,
            status: CampaignStatus::Active,
            created_at: Utc::now(),
        };
        campaigns.push(campaign.clone());

        Ok(campaign)
    }

    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<Campaign>, AppError> {
        let campaigns = self.campaigns.lock().unwrap();
        Ok(campaigns
            .iter()
            .find(|c| c.id == id && owner_matches(c.owner_id, owner_scope))
            .cloned())
    }

    async fn list(
        &self,
        owner_scope: Option<i64>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Campaign>, AppError> {
        let campaigns = self.campaigns.lock().unwrap();

        let mut visible: Vec<Campaign> = campaigns
            .iter()
            .filter(|c| owner_matches(c.owner_id, owner_scope))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(visible
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect())
    }

    async fn count(&self, owner_scope: Option<i64>) -> Result<i64, AppError> {
        let campaigns = self.campaigns.lock().unwrap();
        Ok(campaigns
            .iter()
            .filter(|c| owner_matches(c.owner_id, owner_scope))
            .count() as i64)
    }

    async fn update(
        &self,
        id: i64,
        owner_scope: Option<i64>,
        patch: CampaignPatch,
    ) -> Result<Campaign, AppError> {
        let mut campaigns = self.campaigns.lock().unwrap();

        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == id && owner_matches(c.owner_id, owner_scope))
            .ok_or_else(|| AppError::not_found("Campaign not found", json!({ "id": id })))?;
        patch.apply_to(campaign);

        Ok(campaign.clone())
    }

    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let before = campaigns.len();
        campaigns.retain(|c| !(c.id == id && owner_matches(c.owner_id, owner_scope)));
        if campaigns.len() == before {
            return Ok(false);
        }

        for link in self.links.lock().unwrap().iter_mut() {
            if link.campaign_id == Some(id) {
                link.campaign_id = None;
            }
        }
        Ok(true)
    }
}

fn in_scope(link: &TrackingLink, owner_scope: Option<i64>) -> bool {
    owner_matches(link.owner_id, owner_scope)
}

fn owner_matches(owner_id: i64, owner_scope: Option<i64>) -> bool {
    owner_scope.is_none_or(|owner| owner_id == owner)
}

/// Geolocation by exact address match; everything else is unknown.
#[derive(Default)]
pub struct FakeGeo {
    known: HashMap<String, GeoInfo>,
}

impl FakeGeo {
    pub fn with(mut self, address: &str, country: &str, city: &str) -> Self {
        self.known.insert(
            address.to_string(),
            GeoInfo {
                country: Some(country.to_string()),
                city: Some(city.to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl GeoLocator for FakeGeo {
    async fn resolve(&self, address: &str) -> GeoInfo {
        self.known.get(address).cloned().unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Fixed bearer sessions for three users.
pub struct FakeSessions {
    identities: HashMap<String, CallerIdentity>,
}

impl Default for FakeSessions {
    fn default() -> Self {
        let mut identities = HashMap::new();
        for (token, user_id, username, role) in [
            (ADMIN_TOKEN, ADMIN_ID, "root", Role::Admin),
            (ALICE_TOKEN, ALICE_ID, "alice", Role::Member),
            (BOB_TOKEN, BOB_ID, "bob", Role::Member),
        ] {
            identities.insert(
                hash_session_token(SIGNING_SECRET, token),
                CallerIdentity {
                    user_id,
                    username: username.to_string(),
                    role,
                },
            );
        }
        Self { identities }
    }
}

#[async_trait]
impl SessionRepository for FakeSessions {
    async fn find_identity(&self, token_hash: &str) -> Result<Option<CallerIdentity>, AppError> {
        Ok(self.identities.get(token_hash).cloned())
    }

    async fn create_user(
        &self,
        _username: &str,
        _email: &str,
        _role: Role,
    ) -> Result<UserAccount, AppError> {
        unimplemented!("not used over HTTP")
    }

    async fn find_user_by_username(&self, _username: &str) -> Result<Option<UserAccount>, AppError> {
        unimplemented!("not used over HTTP")
    }

    async fn create_session(
        &self,
        _user_id: i64,
        _token_hash: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        unimplemented!("not used over HTTP")
    }

    async fn revoke_session(&self, _token_hash: &str) -> Result<bool, AppError> {
        unimplemented!("not used over HTTP")
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub server: TestServer,
}

pub fn test_app() -> TestApp {
    test_app_with(FakeGeo::default(), false)
}

/// Builds a server over a fresh store. With `behind_proxy` the source
/// address comes from `X-Forwarded-For`.
pub fn test_app_with(geo: FakeGeo, behind_proxy: bool) -> TestApp {
    let store = InMemoryStore::new();
    let state = create_test_state(store.clone(), Arc::new(geo), behind_proxy);

    let app: Router = build_router(state, false).layer(MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    TestApp { store, server }
}

pub fn create_test_state(
    store: Arc<InMemoryStore>,
    geo: Arc<dyn GeoLocator>,
    behind_proxy: bool,
) -> AppState {
    let geo_provider = geo.name();

    let click_resolver = Arc::new(ClickResolver::new(
        store.clone(),
        store.clone(),
        geo,
        ClientClassifier::default(),
    ));
    let link_service = Arc::new(LinkService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        30,
    ));
    let campaign_service = Arc::new(CampaignService::new(store.clone()));
    let auth_service = Arc::new(AuthService::new(
        Arc::new(FakeSessions::default()),
        SIGNING_SECRET.to_string(),
    ));

    AppState {
        click_resolver,
        link_service,
        campaign_service,
        auth_service,
        links: store,
        geo_provider,
        public_base_url: "https://t.example.com".to_string(),
        behind_proxy,
    }
}

/// An active, unrestricted link owned by Alice.
pub fn link(token: &str, url: &str) -> TrackingLink {
    TrackingLink {
        id: 0,
        token: token.to_string(),
        destination_url: url.to_string(),
        owner_id: ALICE_ID,
        campaign_id: Some(9),
        recipient_email: None,
        recipient_name: None,
        status: LinkStatus::Active,
        created_at: Utc::now(),
        expires_at: None,
        click_limit: 0,
        click_count: 0,
        last_clicked: None,
        custom_message: None,
        redirect_delay: 0,
        access_password_hash: None,
        restrictions: Restrictions::default(),
    }
}

pub async fn insert_user(pool: &sqlx::PgPool, username: &str, role: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username, email, role) VALUES ($1, $2, $3) RETURNING id")
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn new_link(owner_id: i64, token: &str) -> NewTrackingLink {
    NewTrackingLink {
        token: token.to_string(),
        destination_url: "https://example.com/target".to_string(),
        owner_id,
        campaign_id: None,
        recipient_email: None,
        recipient_name: None,
        expires_at: None,
        click_limit: 0,
        custom_message: None,
        redirect_delay: 0,
        access_password_hash: None,
        restrictions: Restrictions::default(),
    }
}

pub fn new_event(link: &TrackingLink) -> NewTrackingEvent {
    NewTrackingEvent {
        token: link.token.clone(),
        event_type: "click".to_string(),
        timestamp: Utc::now(),
        source_address: Some("203.0.113.7".to_string()),
        client_signature: Some("curl/8.5.0".to_string()),
        referrer: None,
        country: Some("US".to_string()),
        city: Some("Chicago".to_string()),
        device_family: Some("other".to_string()),
        browser_family: Some("Other".to_string()),
        platform_family: Some("Other".to_string()),
        is_bot: true,
        bot_confidence: 0.7,
        bot_reason: Some("keyword match".to_string()),
        campaign_id: link.campaign_id,
        owner_id: Some(link.owner_id),
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
