//! End-to-end wiring: registration, launch, validation and routing.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use trellis_router::{
	Capability, CapabilityKey, DeclaredConformance, Destination, IntegrityValidator, ProducerClass,
	RegistrationEvents, Registry, RouteConfiguration, RouteError, RouteFamily, RouteState, Router,
	RouterFactory, RouterSettings, TableId, ValidatorState, ViolationPolicy,
};

pub trait Greet {
	fn greet(&self) -> String;
}

pub struct WelcomeScreen {
	title: String,
}

impl Greet for WelcomeScreen {
	fn greet(&self) -> String {
		format!("welcome to {}", self.title)
	}
}

pub struct Impostor;

impl Greet for Impostor {
	fn greet(&self) -> String {
		String::from("...")
	}
}

#[derive(Debug, Clone, Default)]
pub struct ScreenOptions {
	pub title: String,
}

trellis_router::destination_capability!(pub Welcome => Box<dyn Greet>);
trellis_router::destination_capability!(pub Notifier => String, tag = "app.notifier");
trellis_router::destination_capability!(pub Badge => String, tag = "app.badge");
trellis_router::destination_capability!(pub Clipboard => String, tag = "platform.clipboard", native);
trellis_router::config_capability!(pub ScreenConfig => ScreenOptions);

trellis_router::declare_conformance!(WelcomeScreen => Welcome);

fn init() {
	let _ = tracing_subscriber::fmt::try_init();
}

/// Builds a [`WelcomeScreen`] from its options before returning.
struct ScreenFactory {
	producers: Vec<ProducerClass>,
}

impl ScreenFactory {
	fn new() -> Arc<Self> {
		Arc::new(Self {
			producers: vec![ProducerClass::of::<WelcomeScreen>()],
		})
	}

	fn with_impostor() -> Arc<Self> {
		Arc::new(Self {
			producers: vec![ProducerClass::of::<WelcomeScreen>(), ProducerClass::of::<Impostor>()],
		})
	}
}

impl RouterFactory for ScreenFactory {
	fn name(&self) -> &'static str {
		"screens"
	}

	fn family(&self) -> RouteFamily {
		RouteFamily::View
	}

	fn completes_synchronously(&self) -> bool {
		true
	}

	fn default_options(&self) -> Box<dyn Any> {
		Box::new(ScreenOptions {
			title: String::from("trellis"),
		})
	}

	fn registered_producers(&self) -> Vec<ProducerClass> {
		self.producers.clone()
	}

	fn invoke(&self, mut config: RouteConfiguration) {
		let Some(title) = config.options::<ScreenOptions>().map(|options| options.title.clone()) else {
			config.fail("screen options missing");
			return;
		};
		let screen: Box<dyn Greet> = Box::new(WelcomeScreen { title });
		let mut destination: Destination = Box::new(screen);
		config.prepare(&mut *destination);
		config.complete(destination);
	}
}

thread_local! {
	static OUTBOX: RefCell<Vec<RouteConfiguration>> = const { RefCell::new(Vec::new()) };
}

/// Delivers notifications on a later turn, see [`flush_outbox`].
struct NotifierFactory;

impl RouterFactory for NotifierFactory {
	fn name(&self) -> &'static str {
		"notifier"
	}

	fn family(&self) -> RouteFamily {
		RouteFamily::Service
	}

	fn completes_synchronously(&self) -> bool {
		false
	}

	fn default_options(&self) -> Box<dyn Any> {
		Box::new(())
	}

	fn invoke(&self, config: RouteConfiguration) {
		OUTBOX.with(|outbox| outbox.borrow_mut().push(config));
	}
}

fn flush_outbox() {
	let pending = OUTBOX.with(|outbox| std::mem::take(&mut *outbox.borrow_mut()));
	for config in pending {
		config.complete(Box::new(String::from("delivered")));
	}
}

struct PlatformClipboard;

impl RouterFactory for PlatformClipboard {
	fn name(&self) -> &'static str {
		"platform-clipboard"
	}

	fn family(&self) -> RouteFamily {
		RouteFamily::Service
	}

	fn completes_synchronously(&self) -> bool {
		true
	}

	fn default_options(&self) -> Box<dyn Any> {
		Box::new(())
	}

	fn invoke(&self, config: RouteConfiguration) {
		config.complete(Box::new(String::from("clipboard contents")));
	}
}

fn wired(settings: RouterSettings) -> (Arc<Registry>, Arc<RegistrationEvents>, Vec<Arc<IntegrityValidator>>) {
	let registry = Arc::new(Registry::with_settings(settings));
	let events = Arc::new(RegistrationEvents::new());
	let validators = IntegrityValidator::arm_all(&registry, &events, Arc::new(DeclaredConformance::collect()));

	registry.register_view::<Welcome>(ScreenFactory::new()).unwrap();
	registry.register_view_config::<ScreenConfig>(ScreenFactory::new()).unwrap();
	registry.register_service::<Notifier>(Arc::new(NotifierFactory)).unwrap();
	(registry, events, validators)
}

fn launch(registry: &Registry, events: &RegistrationEvents) {
	registry.finish_launch();
	for family in RouteFamily::ALL {
		events.fire(family);
	}
}

fn native_clipboard(table: TableId, capability: &CapabilityKey) -> Option<Arc<dyn RouterFactory>> {
	(table == TableId::SERVICE && *capability == CapabilityKey::native("platform.clipboard"))
		.then(|| Arc::new(PlatformClipboard) as Arc<dyn RouterFactory>)
}

#[test]
fn application_wires_and_routes() {
	init();
	let settings = RouterSettings::from_toml("violation-policy = \"panic\"").unwrap();
	let (registry, events, validators) = wired(settings);
	launch(&registry, &events);

	for validator in &validators {
		assert_eq!(validator.state(), ValidatorState::Fired);
		assert!(validator.report().is_some_and(|report| report.is_clean()));
	}

	let router = Router::new(Arc::clone(&registry)).with_native_resolver(native_clipboard);
	let screen = router
		.route::<Welcome>(RouteFamily::View)
		.make_destination()
		.unwrap();
	assert_eq!(screen.greet(), "welcome to trellis");

	let configured = router
		.route_config::<ScreenConfig>(RouteFamily::View)
		.prepare(|options| options.title = String::from("the garden"))
		.make_destination()
		.unwrap();
	let screen = configured.downcast::<Box<dyn Greet>>().ok().unwrap();
	assert_eq!(screen.greet(), "welcome to the garden");

	let clipboard = router
		.route::<Clipboard>(RouteFamily::Service)
		.make_destination()
		.unwrap();
	assert_eq!(clipboard, "clipboard contents");
}

#[test]
fn asynchronous_service_completes_later() {
	init();
	let (registry, events, _validators) = wired(RouterSettings::default());
	launch(&registry, &events);
	let router = Router::new(registry);
	let received = Rc::new(RefCell::new(None));
	let sink = Rc::clone(&received);

	let handle = router
		.route::<Notifier>(RouteFamily::Service)
		.prepare(move |message: &mut String| *sink.borrow_mut() = Some(message.clone()))
		.perform()
		.unwrap();
	assert_eq!(handle.state(), RouteState::Pending);
	assert_eq!(*received.borrow(), None);

	flush_outbox();
	assert_eq!(handle.state(), RouteState::Completed);
	assert_eq!(received.borrow().as_deref(), Some("delivered"));
}

#[test]
fn synchronous_request_for_asynchronous_service_is_rejected() {
	init();
	let (registry, events, _validators) = wired(RouterSettings::default().with_policy(ViolationPolicy::Log));
	launch(&registry, &events);

	let err = Router::new(registry)
		.route::<Notifier>(RouteFamily::Service)
		.make_destination()
		.unwrap_err();
	assert_eq!(err, RouteError::Asynchronous { factory: "notifier" });
}

#[rstest]
#[case(RouteFamily::View)]
#[case(RouteFamily::Service)]
fn unwired_capabilities_are_absent(#[case] family: RouteFamily) {
	init();
	let router = Router::new(Arc::new(Registry::with_policy(ViolationPolicy::Panic)));

	assert!(router.route::<Clipboard>(family).perform().is_none());
	assert!(router.route::<Welcome>(family).perform().is_none());
	assert!(router.discovery().resolve(TableId::destination(family), &Welcome::key()).is_none());
}

#[test]
fn impostor_producer_is_reported_after_launch() {
	init();
	let registry = Arc::new(Registry::with_policy(ViolationPolicy::Log));
	let events = Arc::new(RegistrationEvents::new());
	let validators = IntegrityValidator::arm_all(&registry, &events, Arc::new(DeclaredConformance::collect()));
	registry.register_view::<Welcome>(ScreenFactory::with_impostor()).unwrap();

	launch(&registry, &events);
	launch(&registry, &events);

	let view = validators
		.iter()
		.find(|validator| validator.family() == RouteFamily::View)
		.and_then(|validator| validator.report())
		.unwrap();
	assert_eq!(view.checked, 2);
	assert_eq!(
		view.violations,
		vec![RouteError::NonConformingProducer {
			capability: Welcome::TAG,
			factory: "screens",
			producer: std::any::type_name::<Impostor>(),
		}]
	);
}

#[test]
#[should_panic(expected = "after launch finished")]
fn late_registration_panics() {
	init();
	let (registry, events, _validators) = wired(RouterSettings::default().with_policy(ViolationPolicy::Panic));
	launch(&registry, &events);

	let _ = registry.register_service::<Badge>(Arc::new(NotifierFactory));
}
