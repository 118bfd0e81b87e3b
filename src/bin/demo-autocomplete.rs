/// Demo: drive scripted autocomplete widgets through typing and selection and
/// print what each form substrate ends up holding.
use address_sync::{
    app::{ports::PlacesLibrary, MountUseCase, MountedField},
    constants::{PLACE_SELECTED_EVENTS, SETTLE_WINDOW},
    infra::in_memory::{
        InMemoryForm, InMemoryFormStore, InMemoryPlacesLoader, InMemoryPlacesService,
        ScriptedWidgetFactory,
    },
    logging,
    session::WidgetSession,
    sync::{AddressGroup, FormStoreSink, HtmlFormSink},
    types::{AddressComponent, PlaceData},
    widget::WidgetOptions,
};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn infinite_loop() -> PlaceData {
    PlaceData {
        address_components: vec![
            AddressComponent::new("1", "1", &["street_number"]),
            AddressComponent::new("Infinite Loop", "Infinite Loop", &["route"]),
            AddressComponent::new("Cupertino", "Cupertino", &["locality", "political"]),
            AddressComponent::new("California", "CA", &["administrative_area_level_1"]),
            AddressComponent::new("United States", "US", &["country"]),
            AddressComponent::new("95014", "95014", &["postal_code"]),
        ],
        formatted_address: Some("1 Infinite Loop, Cupertino, CA 95014, USA".into()),
        display_name: Some("Apple Infinite Loop".into()),
        place_id: Some("ChIJHTRqF7e1j4ARzZ_Fv8VA4Eo".into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    dotenv::dotenv().ok();

    let service = InMemoryPlacesService::default().with_search(
        "10 downing street, london",
        vec![PlaceData {
            formatted_address: Some("10 Downing St, London, SW1A 2AA, United Kingdom".into()),
            ..Default::default()
        }],
    );
    let widgets = Arc::new(ScriptedWidgetFactory::default());
    let library = PlacesLibrary {
        service: Arc::new(service),
        widgets: widgets.clone(),
    };
    let session = WidgetSession::new(
        Some("demo-key".into()),
        Arc::new(InMemoryPlacesLoader::new(library)),
    );
    let use_case = MountUseCase::new(Arc::new(session));

    let readiness = use_case.initialize_session().await;
    info!(?readiness, "session initialized");

    // Plain form with a select for country
    let form = Arc::new(
        InMemoryForm::default()
            .with_input("address")
            .with_input("line_1")
            .with_input("line_2")
            .with_input("city")
            .with_input("region")
            .with_input("postcode")
            .with_select("country", &["GB", "US"], "GB"),
    );
    let shipping = use_case.mount_address_field(
        Arc::new(HtmlFormSink::new(form.clone(), "address")),
        WidgetOptions {
            id: Some("shipping-address".into()),
            required: true,
            ..Default::default()
        },
    );
    let MountedField::Autocomplete(_shipping_handle) = shipping else {
        bail!("autocomplete unavailable for shipping field");
    };
    let shipping_widget = widgets.last().context("no widget created")?;

    // Managed store for billing
    let store = Arc::new(InMemoryFormStore::default());
    let billing = use_case.mount_address_field(
        Arc::new(FormStoreSink::new(
            store.clone(),
            AddressGroup::Billing,
            "billingAddress.search",
        )),
        WidgetOptions::default(),
    );
    let MountedField::Autocomplete(_billing_handle) = billing else {
        bail!("autocomplete unavailable for billing field");
    };
    let billing_widget = widgets.last().context("no widget created")?;

    // Shipping: user types, then picks a suggestion and the widget fires its event
    shipping_widget.type_text("1 Inf");
    tokio::time::sleep(Duration::from_millis(250)).await;
    let place = infinite_loop();
    shipping_widget.choose("1 Infinite Loop, Cupertino, CA 95014, USA", Some(place.clone()));
    shipping_widget.emit(PLACE_SELECTED_EVENTS[0], Some(place), None);

    // Billing: the widget never fires an event and never exposes a place
    billing_widget.type_text("10 Downing Street, London");
    billing_widget.commit_input();

    tokio::time::sleep(SETTLE_WINDOW + Duration::from_millis(300)).await;

    println!("Plain form:");
    for (name, value) in form.snapshot() {
        println!("  {:<10} {}", name, value);
    }
    println!("Form store:");
    for (path, value) in store.snapshot() {
        println!("  {:<28} {}", path, value);
    }
    println!("Validation batches: {:?}", store.validation_calls());

    Ok(())
}
