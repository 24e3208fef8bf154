use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::scene::SceneObject;

#[derive(Debug, Default)]
struct Slots {
    objects: Vec<SceneObject>,
    by_name: HashMap<String, usize>,
}

impl Slots {
    fn new(objects: Vec<SceneObject>) -> Self {
        let by_name = objects
            .iter()
            .enumerate()
            .map(|(index, object)| (object.name.clone(), index))
            .collect();
        Self { objects, by_name }
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        let index = *self.by_name.get(name)?;
        self.objects.get_mut(index)
    }
}

/// Shared handle to the transforms of every object on the playfield.
///
/// Controllers write into it through their own handle; the frame loop reads a
/// snapshot for drawing. Objects keep the order they were built in.
#[derive(Debug, Default, Clone)]
pub struct DataModel {
    slots: Arc<RwLock<Slots>>,
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: Vec<SceneObject>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots::new(objects))),
        }
    }

    /// Copy of every object in draw order.
    pub fn snapshot(&self) -> Vec<SceneObject> {
        self.slots.read().objects.clone()
    }

    pub fn get(&self, name: &str) -> Option<SceneObject> {
        let slots = self.slots.read();
        let index = *slots.by_name.get(name)?;
        slots.objects.get(index).cloned()
    }

    /// Runs `edit` on the named object; `None` when no such object exists.
    pub fn edit<F, R>(&self, name: &str, edit: F) -> Option<R>
    where
        F: FnOnce(&mut SceneObject) -> R,
    {
        self.slots.write().find_mut(name).map(edit)
    }

    pub fn set_position_x(&self, name: &str, x: f32) -> bool {
        self.edit(name, |object| object.position.x = x).is_some()
    }

    /// Sets the rotation about the vertical axis, in radians.
    pub fn set_yaw(&self, name: &str, yaw: f32) -> bool {
        self.edit(name, |object| object.rotation.y = yaw).is_some()
    }

    pub fn set_scale(&self, name: &str, scale: Vec3) -> bool {
        self.edit(name, |object| object.scale = scale).is_some()
    }

    pub fn set_visible(&self, name: &str, visible: bool) -> bool {
        self.edit(name, |object| object.visible = visible).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            ..SceneObject::default()
        }
    }

    #[test]
    fn handles_see_each_others_writes() {
        let writer = DataModel::from_objects(vec![named("player")]);
        let reader = writer.clone();
        assert!(writer.set_position_x("player", -0.25));
        assert_eq!(reader.get("player").unwrap().position.x, -0.25);
    }

    #[test]
    fn snapshot_keeps_build_order() {
        let model = DataModel::from_objects(vec![named("floor"), named("doll"), named("player")]);
        model.set_yaw("doll", -3.15);
        model.set_visible("doll", false);
        let names: Vec<_> = model
            .snapshot()
            .into_iter()
            .map(|object| object.name)
            .collect();
        assert_eq!(names, ["floor", "doll", "player"]);
        let doll = model.get("doll").unwrap();
        assert_eq!(doll.rotation.y, -3.15);
        assert!(!doll.visible);
    }

    #[test]
    fn writes_to_unknown_names_report_failure() {
        let model = DataModel::new();
        assert!(!model.set_scale("banner", Vec3::ONE));
        assert_eq!(model.edit("banner", |_| ()), None);
        assert!(model.snapshot().is_empty());
    }
}
