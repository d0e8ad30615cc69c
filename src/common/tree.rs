// Árboles por lista de adyacencia (id -> padre_id).
//
// La carga es por niveles: se piden los hijos de todo un nivel en una sola
// consulta y se repite hasta que un nivel vuelve vacío. El ensamblado se
// hace de abajo hacia arriba, sin recursión.

use std::collections::{HashMap, HashSet};
use std::future::Future;

pub trait TreeItem {
    fn id(&self) -> i32;
    fn parent_id(&self) -> Option<i32>;
}

/// Expande `roots` en anchura. `levels[0]` son las raíces y `levels[k]` los
/// hijos directos de `levels[k - 1]`.
///
/// Un nodo ya visitado no se vuelve a expandir, así que datos corruptos con
/// ciclos no provocan un bucle infinito.
pub async fn expand_levels<T, E, F, Fut>(roots: Vec<T>, mut fetch_children: F) -> Result<Vec<Vec<T>>, E>
where
    T: TreeItem,
    F: FnMut(Vec<i32>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut visited: HashSet<i32> = roots.iter().map(TreeItem::id).collect();
    let mut levels = Vec::new();
    let mut current = roots;

    while !current.is_empty() {
        let parent_ids: Vec<i32> = current.iter().map(TreeItem::id).collect();
        levels.push(current);

        let children: Vec<T> = fetch_children(parent_ids)
            .await?
            .into_iter()
            .filter(|child| visited.insert(child.id()))
            .collect();

        current = children;
    }

    Ok(levels)
}

/// Construye el bosque a partir de los niveles de `expand_levels`.
/// `make_node` recibe cada elemento con sus hijos ya ensamblados.
pub fn assemble_forest<T, N>(levels: Vec<Vec<T>>, make_node: impl Fn(T, Vec<N>) -> N) -> Vec<N>
where
    T: TreeItem,
{
    let mut roots = Vec::new();
    let mut pending: HashMap<i32, Vec<N>> = HashMap::new();

    for level in levels.into_iter().rev() {
        let mut by_parent: HashMap<i32, Vec<N>> = HashMap::new();

        for item in level {
            let id = item.id();
            let parent_id = item.parent_id();
            let children = pending.remove(&id).unwrap_or_default();
            let node = make_node(item, children);

            match parent_id {
                Some(parent) => by_parent.entry(parent).or_default().push(node),
                None => roots.push(node),
            }
        }

        pending = by_parent;
    }

    roots
}
