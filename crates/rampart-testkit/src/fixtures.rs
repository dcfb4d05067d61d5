//! Canonical test networks

use rampart_core::{Link, LinkKind, Network, Node, NodeKind};

/// Six-node office network: two servers behind a router, a switch and two
/// clients.
pub fn sample_network() -> Network {
    let mut network = Network::new("sample");
    let nodes = [
        ("server1", NodeKind::Server, 1000.0, 0.99),
        ("server2", NodeKind::Server, 800.0, 0.98),
        ("router1", NodeKind::Router, 500.0, 0.95),
        ("switch1", NodeKind::Switch, 300.0, 0.97),
        ("client1", NodeKind::Client, 100.0, 0.92),
        ("client2", NodeKind::Client, 100.0, 0.90),
    ];
    for (id, kind, capacity, reliability) in nodes {
        let node = Node::new(id, kind)
            .with_capacity(capacity)
            .unwrap()
            .with_reliability(reliability)
            .unwrap();
        network.add_node(node).unwrap();
    }
    let links = [
        ("server1", "router1", LinkKind::Fiber, 0.98),
        ("server2", "router1", LinkKind::Fiber, 0.97),
        ("router1", "switch1", LinkKind::Ethernet, 0.99),
        ("switch1", "client1", LinkKind::Ethernet, 0.95),
        ("switch1", "client2", LinkKind::Ethernet, 0.94),
    ];
    for (a, b, kind, reliability) in links {
        let link = Link::new(a, b, kind).with_reliability(reliability).unwrap();
        network.add_link(link).unwrap();
    }
    network
}

fn numbered(name: &str, n: usize, kind: NodeKind) -> Network {
    let mut network = Network::new(name);
    for i in 0..n {
        network.add_node(Node::new(format!("n{i}"), kind)).unwrap();
    }
    network
}

/// Nodes `n0..n{n-1}` with every pair linked
pub fn complete_network(n: usize) -> Network {
    let mut network = numbered("complete", n, NodeKind::Router);
    for i in 0..n {
        for j in i + 1..n {
            network
                .connect(format!("n{i}"), format!("n{j}"), LinkKind::Fiber)
                .unwrap();
        }
    }
    network
}

/// Nodes `n0..n{n-1}` in a line
pub fn path_network(n: usize) -> Network {
    let mut network = numbered("path", n, NodeKind::Switch);
    for i in 1..n {
        network
            .connect(format!("n{}", i - 1), format!("n{i}"), LinkKind::Ethernet)
            .unwrap();
    }
    network
}

/// Hub `hub` linked to leaves `leaf0..`
pub fn star_network(leaves: usize) -> Network {
    let mut network = Network::new("star");
    network.add_node(Node::new("hub", NodeKind::Switch)).unwrap();
    for i in 0..leaves {
        let leaf = format!("leaf{i}");
        network.add_node(Node::new(leaf.as_str(), NodeKind::Client)).unwrap();
        network.connect("hub", leaf, LinkKind::Ethernet).unwrap();
    }
    network
}

/// Triangles `{a, b, c}` and `{d, e, f}` joined only through cut node `v`
/// (linked to `a` and `d`), plus node `i` with no links.
pub fn bridged_network() -> Network {
    let mut network = Network::new("bridged");
    for id in ["a", "b", "c", "d", "e", "f", "v"] {
        network.add_node(Node::new(id, NodeKind::Router)).unwrap();
    }
    network.add_node(Node::new("i", NodeKind::Client)).unwrap();
    for (x, y) in [
        ("a", "b"),
        ("b", "c"),
        ("a", "c"),
        ("d", "e"),
        ("e", "f"),
        ("d", "f"),
        ("v", "a"),
        ("v", "d"),
    ] {
        network.connect(x, y, LinkKind::Fiber).unwrap();
    }
    network
}
