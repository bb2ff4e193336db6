// ============================================================================
// spark-vdom - Ergonomic Macros
// ============================================================================

/// Clone variables into a move closure.
///
/// Saves the `let x = x.clone();` dance before handing reactive handles to an
/// effect or an event handler.
///
/// # Usage
///
/// ```rust
/// use std::collections::HashMap;
/// use spark_vdom::{cloned, reactive, watch_effect};
///
/// let state = reactive(HashMap::from([("n".to_string(), 1)]));
/// let _effect = watch_effect(cloned!(state => move || {
///     let _ = state.get("n");
/// }))
/// .unwrap();
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Create an effect with automatic variable capturing.
///
/// Wraps `watch_effect(cloned!(... => move || ...))`.
///
/// # Usage
///
/// ```rust
/// use std::collections::HashMap;
/// use spark_vdom::{effect, reactive};
///
/// let state = reactive(HashMap::from([("n".to_string(), 1)]));
/// let _effect = effect!(state => {
///     println!("n is {:?}", state.get("n"));
/// })
/// .unwrap();
/// ```
#[macro_export]
macro_rules! effect {
    // Case 1: With dependencies
    ($($deps:ident),+ => $body:expr) => {
        $crate::watch_effect($crate::cloned!($($deps),+ => move || { $body; }))
    };
    // Case 2: No dependencies
    ($body:expr) => {
        $crate::watch_effect(move || { $body; })
    };
}

/// Build a [`Props`](crate::Props) map.
///
/// Keys convert with `String::from`, values with `PropValue::from`.
///
/// ```rust
/// use spark_vdom::{props, PropValue};
///
/// let p = props! { "class" => "lead", "tabindex" => 0 };
/// assert_eq!(p.get("class"), Some(&PropValue::from("lead")));
/// assert!(props!().is_empty());
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(
            props.insert(
                ::std::string::String::from($key),
                $crate::PropValue::from($value),
            );
        )+
        props
    }};
}

/// Shorthand for [`h`](crate::h) with optional properties and children.
///
/// ```rust
/// use spark_vdom::h;
///
/// let list = h!("ul", { "class" => "items" }, vec![
///     h!("li", "one"),
///     h!("li", { "data-id" => 2 }),
///     h!("hr"),
/// ]);
/// assert_eq!(list.node_count(), 4);
/// ```
#[macro_export]
macro_rules! h {
    ($tag:expr, { $($key:expr => $value:expr),* $(,)? } $(,)?) => {
        $crate::h($tag, $crate::props!($($key => $value),*), ())
    };
    ($tag:expr, { $($key:expr => $value:expr),* $(,)? }, $children:expr $(,)?) => {
        $crate::h($tag, $crate::props!($($key => $value),*), $children)
    };
    ($tag:expr, $children:expr $(,)?) => {
        $crate::h($tag, $crate::Props::new(), $children)
    };
    ($tag:expr $(,)?) => {
        $crate::h($tag, $crate::Props::new(), ())
    };
}
