use js_sys::Promise;
use shared::Coordinate;
use wasm_bindgen::{prelude::JsValue, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Position, PositionError, PositionOptions};

const PLATFORM_TIMEOUT_MS: u32 = 10_000;

/// Asks the browser for the device position once. The callback pair of the
/// platform API is folded into a single future; failures collapse to a
/// displayable string and the caller decides how to degrade.
pub async fn current_position() -> Result<Coordinate, String> {
    let geolocation = seed::window()
        .navigator()
        .geolocation()
        .map_err(|err| format!("geolocation unavailable: {err:?}"))?;

    let options = PositionOptions::new();
    options.set_enable_high_accuracy(true);
    options.set_timeout(PLATFORM_TIMEOUT_MS);

    let position = Promise::new(&mut |resolve, reject| {
        let outcome = geolocation.get_current_position_with_error_callback_and_options(
            &resolve,
            Some(&reject),
            &options,
        );
        if let Err(err) = outcome {
            let _ = reject.call1(&JsValue::NULL, &err);
        }
    });

    match JsFuture::from(position).await {
        Ok(value) => {
            let coords = value.unchecked_into::<Position>().coords();
            Ok(Coordinate {
                lat: coords.latitude(),
                lon: coords.longitude(),
            })
        }
        Err(err) => Err(describe_failure(&err)),
    }
}

fn describe_failure(err: &JsValue) -> String {
    match err.dyn_ref::<PositionError>() {
        Some(failure) => failure.message(),
        None => format!("{err:?}"),
    }
}
