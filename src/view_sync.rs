//! Keeps the globe's point of view in step with the camera.

use instant::Duration;

use crate::{
    camera::{Camera, OrbitControls},
    data_structures::globe::GlobeObject,
};

/// Store the camera position, relative to the globe, as the globe's point of view.
///
/// Called once before the first frame and then from the controls' change notification.
pub fn sync_point_of_view(camera: &Camera, globe: &mut GlobeObject) {
    let globe_position = globe.position;
    globe.set_point_of_view(camera.position, globe_position);
    if let Some(pov) = &globe.point_of_view {
        log::trace!(
            "Point of view lat {:.3} lng {:.3} alt {:.4}",
            pov.geo.lat,
            pov.geo.lng,
            pov.geo.altitude
        );
    }
}

/// Advance `controls` by `dt` with [`sync_point_of_view`] as the change handler.
///
/// Returns whether the camera moved; the point of view is left alone otherwise.
pub fn update_and_sync(controls: &mut OrbitControls, camera: &mut Camera, globe: &mut GlobeObject, dt: Duration) -> bool {
    controls.update(camera, dt, |camera| sync_point_of_view(camera, globe))
}
