//! Shared drivetrain fixture for proxy integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use wrapkit_proxy::{
    foreign_enum, foreign_type, Collection, ForeignType, Overridable, ProxyConfig, ProxyResult,
    Session, Wrapper, WrapperRegistry,
};
use wrapkit_runtime::MemoryRuntime;
use wrapkit_types::{ForeignValue, HandleId};

foreign_type! {
    pub struct Component => "Drive.Component";
    pub struct Bearing => "Drive.Bearing";
    pub struct RollingBearing => "Drive.RollingBearing";
    pub struct Shaft => "Drive.Shaft";
}

foreign_enum! {
    pub enum LubricantType => "Drive.LubricantType" { Mineral, Synthetic, Grease }
}

impl Component {
    pub fn id(&self) -> ProxyResult<i64> {
        self.handle().get("Id")
    }

    pub fn name(&self) -> ProxyResult<String> {
        self.handle().get("Name")
    }
}

impl Bearing {
    pub fn name(&self) -> ProxyResult<String> {
        self.handle().get("Name")
    }

    pub fn bore(&self) -> ProxyResult<f64> {
        self.handle().get("Bore")
    }

    pub fn set_bore(&self, value: f64) -> ProxyResult<()> {
        self.handle().set("Bore", value)
    }

    pub fn lubricant(&self) -> ProxyResult<LubricantType> {
        self.handle().get("Lubricant")
    }

    pub fn set_lubricant(&self, value: LubricantType) -> ProxyResult<()> {
        self.handle().set("Lubricant", value)
    }

    pub fn notes(&self) -> ProxyResult<Option<String>> {
        self.handle().get("Notes")
    }
}

impl RollingBearing {
    pub fn rating(&self) -> ProxyResult<Overridable<f64>> {
        self.handle().get("Rating")
    }

    pub fn set_rating(&self, value: Overridable<f64>) -> ProxyResult<()> {
        self.handle().set("Rating", value)
    }
}

impl Shaft {
    pub fn name(&self) -> ProxyResult<String> {
        self.handle().get("Name")
    }

    pub fn main_bearing(&self) -> ProxyResult<Box<dyn Wrapper>> {
        self.handle().get_wrapper_as::<Bearing>("MainBearing")
    }

    pub fn spare(&self) -> ProxyResult<Option<Box<dyn Wrapper>>> {
        self.handle().get_optional_wrapper("Spare")
    }

    pub fn bearings(&self) -> ProxyResult<Collection<Bearing>> {
        self.handle().get_collection("Bearings")
    }
}

/// Declares the drivetrain type hierarchy on a fresh runtime.
///
/// `Drive.TaperedBearing` has no local wrapper, so it resolves to its
/// nearest registered ancestor.
pub fn drivetrain_runtime() -> Arc<MemoryRuntime> {
    let rt = MemoryRuntime::new();
    rt.define_type("Drive.Component", None).unwrap();
    rt.define_type("Drive.Bearing", Some("Drive.Component")).unwrap();
    rt.define_type("Drive.RollingBearing", Some("Drive.Bearing")).unwrap();
    rt.define_type("Drive.TaperedBearing", Some("Drive.RollingBearing")).unwrap();
    rt.define_type("Drive.Shaft", Some("Drive.Component")).unwrap();
    rt.define_type("Drive.ComponentList", None).unwrap();
    rt.define_type("Drive.Housing", None).unwrap();
    rt.define_enum("Drive.LubricantType", ["Mineral", "Synthetic", "Grease"]);
    Arc::new(rt)
}

pub fn registry() -> WrapperRegistry {
    let mut registry = WrapperRegistry::new();
    registry.register::<Component>().unwrap();
    registry.register::<Bearing>().unwrap();
    registry.register::<RollingBearing>().unwrap();
    registry.register::<Shaft>().unwrap();
    registry
}

pub fn bearing(rt: &MemoryRuntime, type_name: &str, id: i64, name: &str) -> HandleId {
    rt.create(
        type_name,
        [
            ("Id", ForeignValue::Int(id)),
            ("Name", ForeignValue::from(name)),
            ("Bore", ForeignValue::Float(25.0)),
            (
                "Lubricant",
                ForeignValue::enum_member("Drive.LubricantType", "Mineral"),
            ),
            ("Notes", ForeignValue::Null),
            (
                "Rating",
                ForeignValue::overridable(ForeignValue::Float(14.5), false),
            ),
        ],
    )
    .unwrap()
}

/// A shaft with three bearings: ids 1, 2, 3 named "A", "B", "A".
pub struct Drivetrain {
    pub runtime: Arc<MemoryRuntime>,
    pub session: Session,
    pub shaft: HandleId,
    pub list: HandleId,
    pub bearings: Vec<HandleId>,
}

impl Drivetrain {
    pub fn new() -> Self {
        Self::with_config(ProxyConfig::default())
    }

    pub fn with_config(config: ProxyConfig) -> Self {
        let runtime = drivetrain_runtime();
        let bearings = vec![
            bearing(&runtime, "Drive.RollingBearing", 1, "A"),
            bearing(&runtime, "Drive.TaperedBearing", 2, "B"),
            bearing(&runtime, "Drive.Bearing", 3, "A"),
        ];
        let list = runtime
            .create_collection("Drive.ComponentList", bearings.clone())
            .unwrap();
        let shaft = runtime
            .create(
                "Drive.Shaft",
                [
                    ("Id", ForeignValue::Int(10)),
                    ("Name", ForeignValue::from("Input")),
                    ("MainBearing", ForeignValue::Handle(bearings[1])),
                    ("Spare", ForeignValue::Null),
                    ("Bearings", ForeignValue::Handle(list)),
                ],
            )
            .unwrap();
        runtime.set_root("Input", shaft).unwrap();
        let session = Session::with_config(runtime.clone(), registry(), config);
        Self {
            runtime,
            session,
            shaft,
            list,
            bearings,
        }
    }

    pub fn shaft(&self) -> Shaft {
        Shaft::from_handle(self.session.acquire(self.shaft).unwrap())
    }

    pub fn collection(&self) -> Collection<Bearing> {
        Collection::new(self.session.acquire(self.list).unwrap()).unwrap()
    }

    /// Live reference count as seen by the runtime.
    pub fn refs(&self, id: HandleId) -> u32 {
        self.runtime.ref_count(id).unwrap_or(0)
    }
}
