//! Demo drivetrain schema: typed wrappers, enums, native methods and the
//! overload catalog used by `wrapkit call`.

use tracing::debug;
use wrapkit_proxy::{
    foreign_enum, foreign_type, Collection, ForeignEnum, OverloadSet, Overridable, ParamShape,
    ProxyResult, ValueKind, Wrapper, WrapperRegistry,
};
use wrapkit_runtime::{ForeignObject, MemoryRuntime, RuntimeError, RuntimeResult};
use wrapkit_types::ForeignValue;

foreign_type! {
    /// Any part of a drivetrain.
    pub struct Component => "Drive.Component";
    /// A top-level assembly holding shafts.
    pub struct Assembly => "Drive.Assembly";
    pub struct Shaft => "Drive.Shaft";
    pub struct Bearing => "Drive.Bearing";
    /// A bearing with a catalogue load rating.
    pub struct RollingBearing => "Drive.RollingBearing";
    pub struct Gear => "Drive.Gear";
}

foreign_enum! {
    pub enum LubricantType => "Drive.LubricantType" { Mineral, Synthetic, Grease }
}

impl Component {
    pub fn name(&self) -> ProxyResult<String> {
        self.handle().get("Name")
    }
}

impl Assembly {
    pub fn shafts(&self) -> ProxyResult<Collection<Shaft>> {
        self.handle().get_collection("Shafts")
    }
}

impl Shaft {
    pub fn length(&self) -> ProxyResult<f64> {
        self.handle().get("Length")
    }

    pub fn bearings(&self) -> ProxyResult<Collection<Bearing>> {
        self.handle().get_collection("Bearings")
    }
}

impl Bearing {
    pub fn bore(&self) -> ProxyResult<f64> {
        self.handle().get("Bore")
    }

    pub fn lubricant(&self) -> ProxyResult<Option<LubricantType>> {
        self.handle().get("Lubricant")
    }
}

impl RollingBearing {
    pub fn bore(&self) -> ProxyResult<f64> {
        self.handle().get("Bore")
    }

    /// Dynamic load rating in kN.
    pub fn rating(&self) -> ProxyResult<Overridable<f64>> {
        self.handle().get("Rating")
    }
}

impl Gear {
    pub fn teeth(&self) -> ProxyResult<u32> {
        self.handle().get("Teeth")
    }

    pub fn module(&self) -> ProxyResult<f64> {
        self.handle().get("Module")
    }
}

/// Registry holding every demo wrapper.
pub fn registry() -> ProxyResult<WrapperRegistry> {
    WrapperRegistry::new()
        .with::<Component>()?
        .with::<Assembly>()?
        .with::<Shaft>()?
        .with::<Bearing>()?
        .with::<RollingBearing>()?
        .with::<Gear>()
}

/// One-line, type-specific description of a wrapped object.
pub fn summary(wrapper: &dyn Wrapper) -> ProxyResult<String> {
    if let Some(shaft) = wrapper.downcast_ref::<Shaft>() {
        let bearings = shaft.bearings()?.count()?;
        return Ok(format!("length {} mm, {bearings} bearings", shaft.length()?));
    }
    if let Some(bearing) = wrapper.downcast_ref::<RollingBearing>() {
        let rating = bearing.rating()?;
        let pinned = if rating.overridden { " (pinned)" } else { "" };
        return Ok(format!(
            "bore {} mm, rating {} kN{pinned}",
            bearing.bore()?,
            rating.value
        ));
    }
    if let Some(bearing) = wrapper.downcast_ref::<Bearing>() {
        let lubricant = bearing
            .lubricant()?
            .map_or("unlubricated", ForeignEnum::member);
        return Ok(format!("bore {} mm, {lubricant}", bearing.bore()?));
    }
    if let Some(gear) = wrapper.downcast_ref::<Gear>() {
        return Ok(format!("{} teeth, module {}", gear.teeth()?, gear.module()?));
    }
    if let Some(assembly) = wrapper.downcast_ref::<Assembly>() {
        return Ok(format!("{} shafts", assembly.shafts()?.count()?));
    }
    Ok(String::new())
}

// ================================================================
// Methods
// ================================================================

/// Overload sets for the methods `wrapkit call` knows about.
pub fn overloads_for(method: &str) -> Option<OverloadSet> {
    match method {
        "Mount" => Some(
            OverloadSet::new("Mount")
                .overload("(Drive.Bearing)", vec![ParamShape::identity("Drive.Bearing")])
                .overload("(float)", vec![ParamShape::Primitive(ValueKind::Float)])
                .overload(
                    "(float,float)",
                    vec![
                        ParamShape::Primitive(ValueKind::Float),
                        ParamShape::Primitive(ValueKind::Float),
                    ],
                ),
        ),
        "Life" => Some(OverloadSet::new("Life").overload(
            "(float,float)",
            vec![
                ParamShape::Primitive(ValueKind::Float),
                ParamShape::Primitive(ValueKind::Float),
            ],
        )),
        _ => None,
    }
}

/// Installs the demo native methods. Types the snapshot does not declare
/// are skipped.
pub fn install_methods(rt: &MemoryRuntime) -> RuntimeResult<()> {
    define(rt, "Drive.Shaft", "Mount", "(Drive.Bearing)", |shaft, args| {
        let bearing = args
            .first()
            .and_then(ForeignValue::as_handle)
            .ok_or_else(|| RuntimeError::Foreign("Mount expects a bearing".into()))?;
        Ok(ForeignValue::Str(format!(
            "{} carries bearing {bearing}",
            shaft.get_str("Name").unwrap_or("shaft")
        )))
    })?;
    define(rt, "Drive.Shaft", "Mount", "(float)", |shaft, args| {
        let offset = number_arg(args, 0)?;
        check_offset(shaft, offset)?;
        Ok(ForeignValue::Str(format!("bearing seat at {offset} mm")))
    })?;
    define(rt, "Drive.Shaft", "Mount", "(float,float)", |shaft, args| {
        let offset = number_arg(args, 0)?;
        let preload = number_arg(args, 1)?;
        check_offset(shaft, offset)?;
        Ok(ForeignValue::Str(format!(
            "bearing seat at {offset} mm, preload {preload} kN"
        )))
    })?;
    define(rt, "Drive.RollingBearing", "Life", "(float,float)", |bearing, args| {
        let load = number_arg(args, 0)?;
        let speed = number_arg(args, 1)?;
        if load <= 0.0 || speed <= 0.0 {
            return Err(RuntimeError::Foreign(
                "load and speed must be positive".into(),
            ));
        }
        let rating = match bearing.property("Rating") {
            Some(ForeignValue::Overridable { value, .. }) => value.as_f64(),
            Some(other) => other.as_f64(),
            None => None,
        }
        .ok_or_else(|| RuntimeError::Foreign("bearing has no load rating".into()))?;
        // Basic rating life in hours, ball bearing exponent.
        let hours = (rating / load).powi(3) * 1_000_000.0 / (60.0 * speed);
        Ok(ForeignValue::Float(hours))
    })?;
    Ok(())
}

fn define<F>(
    rt: &MemoryRuntime,
    type_name: &str,
    method: &str,
    signature: &str,
    f: F,
) -> RuntimeResult<()>
where
    F: Fn(&ForeignObject, &[ForeignValue]) -> RuntimeResult<ForeignValue> + Send + Sync + 'static,
{
    match rt.define_method(type_name, method, signature, f) {
        Err(RuntimeError::UnknownType(_)) => {
            debug!(type_name, method, "Type not in snapshot, skipping method");
            Ok(())
        }
        other => other,
    }
}

fn number_arg(args: &[ForeignValue], index: usize) -> RuntimeResult<f64> {
    args.get(index)
        .and_then(ForeignValue::as_f64)
        .ok_or_else(|| RuntimeError::Foreign(format!("argument {index} must be a number")))
}

fn check_offset(shaft: &ForeignObject, offset: f64) -> RuntimeResult<()> {
    match shaft.get_number("Length") {
        Some(length) if offset < 0.0 || offset > length => Err(RuntimeError::Foreign(format!(
            "offset {offset} mm is outside the shaft (length {length} mm)"
        ))),
        _ => Ok(()),
    }
}
