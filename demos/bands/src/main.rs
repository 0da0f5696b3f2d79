//! Bands API demo for docspec
//!
//! This demo documents:
//! - A view function on the application (`list_bands`)
//! - A resource class inside a blueprint (`BandResource`), registered
//!   before the documentation is attached
//! - Everything else picked up by `register_existing_resources`
//!
//! Run with: cargo run -p bands
//! Then visit: http://127.0.0.1:8080/swagger-ui/

use docspec::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

// ============================================
// Data Models
// ============================================

/// A band in the catalogue
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Band {
    pub id: u64,
    pub name: String,
    pub genre: String,
}

/// Request body for adding a band
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewBand {
    pub name: String,
    pub genre: String,
}

/// Query parameters for listing bands
#[derive(Debug, Deserialize, IntoParams)]
pub struct BandQuery {
    /// Only bands of this genre
    pub genre: Option<String>,
}

// ============================================
// In-Memory Store
// ============================================

#[derive(Default)]
pub struct BandStore {
    bands: RwLock<BTreeMap<u64, Band>>,
}

impl BandStore {
    fn seeded() -> Self {
        let store = Self::default();
        store.insert("Queen", "rock");
        store.insert("Slowdive", "shoegaze");
        store.insert("Kraftwerk", "electronic");
        store
    }

    fn insert(&self, name: &str, genre: &str) -> Band {
        let mut bands = self.bands.write().unwrap_or_else(PoisonError::into_inner);
        let id = bands.keys().next_back().map_or(1, |id| id + 1);
        let band = Band {
            id,
            name: name.to_string(),
            genre: genre.to_string(),
        };
        bands.insert(id, band.clone());
        band
    }

    fn get(&self, id: u64) -> Option<Band> {
        let bands = self.bands.read().unwrap_or_else(PoisonError::into_inner);
        bands.get(&id).cloned()
    }

    fn list(&self, genre: Option<&str>) -> Vec<Band> {
        let bands = self.bands.read().unwrap_or_else(PoisonError::into_inner);
        bands
            .values()
            .filter(|band| genre.map_or(true, |genre| band.genre == genre))
            .cloned()
            .collect()
    }

    fn remove(&self, id: u64) -> bool {
        let mut bands = self.bands.write().unwrap_or_else(PoisonError::into_inner);
        bands.remove(&id).is_some()
    }
}

fn store() -> &'static BandStore {
    static STORE: OnceLock<BandStore> = OnceLock::new();
    STORE.get_or_init(BandStore::seeded)
}

fn band_id(req: &Request) -> Result<u64, ApiError> {
    req.view_arg("band_id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| ApiError::bad_request("band_id must be an integer"))
}

// ============================================
// Handlers
// ============================================

async fn list_bands(req: Request) -> Result<Json<Vec<Band>>, ApiError> {
    let query: BandQuery = req.query()?;
    Ok(Json(store().list(query.genre.as_deref())))
}

async fn create_band(req: Request) -> Result<(StatusCode, Json<Band>), ApiError> {
    let new_band: NewBand = req.json()?;
    let band = store().insert(&new_band.name, &new_band.genre);
    info!(id = band.id, name = %band.name, "Band created");
    Ok((StatusCode::CREATED, Json(band)))
}

/// One band, addressed by id
///
/// The constructor argument is the label shown as the tag in the docs.
struct BandResource {
    label: String,
}

impl MethodResource for BandResource {
    fn construct(args: &ResourceArgs) -> Result<Self, ResourceError> {
        Ok(Self {
            label: args.get_or(0, "label", "band".to_string())?,
        })
    }

    fn annotations(&self) -> Annotations {
        Annotations::new().tags([self.label.as_str()])
    }

    fn methods(self: Arc<Self>) -> ResourceMethods {
        ResourceMethods::new()
            .get(
                get_band,
                Annotations::new()
                    .summary("Fetch a band")
                    .path_param("band_id", json!({"description": "Band id"}))
                    .marshal_with::<Band>(200)
                    .response(404, "Band not found"),
            )
            .delete(
                delete_band,
                Annotations::new()
                    .summary("Remove a band")
                    .response(204, "Band removed"),
            )
    }
}

async fn get_band(req: Request) -> Result<Json<Band>, ApiError> {
    let id = band_id(&req)?;
    store()
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Band {} not found", id)))
}

async fn delete_band(req: Request) -> Result<StatusCode, ApiError> {
    let id = band_id(&req)?;
    if store().remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Band {} not found", id)))
    }
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = App::new("bands");
    app.configure("APISPEC_TITLE", "Bands API")
        .configure("APISPEC_VERSION", "v1");

    let list = ViewFunction::new("list_bands", list_bands).annotate(|a| {
        a.tags(["bands"])
            .summary("List bands")
            .use_kwargs::<BandQuery>()
            .response(200, "All bands, optionally filtered by genre")
    });
    let create = ViewFunction::new("create_band", create_band).annotate(|a| {
        a.tags(["bands"])
            .summary("Add a band")
            .marshal_with_description::<Band>(201, "Band created")
    });
    app.route("/bands/", &[Method::GET], list.clone())?;
    app.route("/bands/", &[Method::POST], create.clone())?;
    app.route("/health", &[Method::GET], ViewFunction::new("health", health))?;

    let band = ResourceClass::of::<BandResource>();
    let mut api = Blueprint::new("api").url_prefix("/api");
    api.add_url_rule(
        "/bands/<int:band_id>/",
        Some("band"),
        band.as_view(ResourceArgs::new().arg("band")),
        None,
    );

    // Registered before the blueprint exists; replayed on attachment
    let mut docs = ApiDocs::new();
    docs.register_with(
        &band,
        RegisterOptions::new()
            .endpoint("band")
            .blueprint("api")
            .arg("band"),
    )?;

    app.register_blueprint(api)?;
    docs.init_app(&app)?;
    docs.register(&list)?;
    docs.register(&create)?;
    docs.register_existing_resources()?;

    info!("Swagger UI at http://127.0.0.1:8080/swagger-ui/");
    app.run("127.0.0.1:8080").await
}
