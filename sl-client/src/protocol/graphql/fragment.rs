//! GraphQL fragments derived from the typed models.
//!
//! Each model describes its wire fields once through [`WireModel`]. Fragments for an operation
//! are generated from those descriptors, so the request text and the decoded types cannot drift
//! apart.

/// Placeholder in operation templates replaced by the main fragment's name.
pub const FRAGMENT_PLACEHOLDER: &str = "&fragment";

/// One field selected in a fragment.
#[derive(Debug, Clone, Copy)]
pub enum WireField {
    Scalar(&'static str),
    Nested {
        name: &'static str,
        model: ModelRef,
        /// Deferrable fields are left out when metadata is loaded lazily.
        deferrable: bool,
    },
}

impl WireField {
    pub const fn scalar(name: &'static str) -> Self {
        WireField::Scalar(name)
    }

    pub fn nested<M: WireModel>(name: &'static str) -> Self {
        WireField::Nested {
            name,
            model: ModelRef::of::<M>(),
            deferrable: false,
        }
    }

    pub fn deferred<M: WireModel>(name: &'static str) -> Self {
        WireField::Nested {
            name,
            model: ModelRef::of::<M>(),
            deferrable: true,
        }
    }
}

/// Type-erased handle to a [`WireModel`] implementation.
#[derive(Debug, Clone, Copy)]
pub struct ModelRef {
    type_name: &'static str,
    fields: fn() -> Vec<WireField>,
}

impl ModelRef {
    pub fn of<M: WireModel>() -> Self {
        Self {
            type_name: M::TYPE_NAME,
            fields: M::wire_fields,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fragment_name(&self) -> String {
        format!("fragment{}", self.type_name)
    }
}

/// A model that can be selected over GraphQL.
pub trait WireModel {
    /// GraphQL type the fragment is declared on.
    const TYPE_NAME: &'static str;

    fn wire_fields() -> Vec<WireField>;

    /// Returns the fragments needed to select this model, its own fragment first.
    fn fragments(lazy: bool) -> Vec<GraphQLFragment>
    where
        Self: Sized,
    {
        collect_fragments(ModelRef::of::<Self>(), lazy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLFragment {
    pub name: String,
    pub body: String,
}

/// Builds the fragment of `model` followed by the fragments it depends on.
///
/// Dependencies are listed in order of first appearance and each fragment appears once.
pub fn collect_fragments(model: ModelRef, lazy: bool) -> Vec<GraphQLFragment> {
    let mut fragments = Vec::new();
    visit(model, lazy, &mut fragments);
    fragments
}

fn visit(model: ModelRef, lazy: bool, fragments: &mut Vec<GraphQLFragment>) {
    let name = model.fragment_name();
    if fragments.iter().any(|fragment| fragment.name == name) {
        return;
    }

    let fields = (model.fields)();
    let mut selections = Vec::with_capacity(fields.len());
    let mut dependencies = Vec::new();
    for field in fields {
        match field {
            WireField::Scalar(field_name) => selections.push(field_name.to_string()),
            WireField::Nested {
                deferrable: true, ..
            } if lazy => {}
            WireField::Nested {
                name: field_name,
                model: nested,
                ..
            } => {
                selections.push(format!("{field_name} {{ ...{} }}", nested.fragment_name()));
                dependencies.push(nested);
            }
        }
    }

    let body = format!(
        "fragment {name} on {} {{ {} }}",
        model.type_name(),
        selections.join(" ")
    );
    fragments.push(GraphQLFragment { name, body });

    for dependency in dependencies {
        visit(dependency, lazy, fragments);
    }
}

/// Collapses every run of whitespace into a single space.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substitutes the main fragment into `template` and appends every fragment body.
pub fn render_query(template: &str, fragments: &[GraphQLFragment]) -> String {
    let mut query = match fragments.first() {
        Some(main) => normalize_query(&template.replace(FRAGMENT_PLACEHOLDER, &main.name)),
        None => normalize_query(template),
    };

    for fragment in fragments {
        query.push(' ');
        query.push_str(&fragment.body);
    }

    query
}
