//! Link dump and rename tests across namespaces.

use veth_namer::netlink::{Result, namespace};
use veth_namer::reexec::veth_links;
use veth_namer::rename::{HostLinks, RenameOutcome, Renamer};
use veth_namer::{Config, LinkNamer};

use crate::common::TestNamespace;

#[tokio::test]
async fn test_veth_peer_index_points_to_host_end() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("host")?;
    let container = TestNamespace::new("ctr")?;
    host.connect_to(&container, "vethtest0", "eth0")?;
    container.add_dummy("dummy0")?;

    let host_links = host.connection()?.get_links().await?;
    let host_end = host_links
        .iter()
        .find(|l| l.name() == Some("vethtest0"))
        .expect("host end present");
    assert!(host_end.is_veth());

    let container_links = container.connection()?.get_links().await?;
    let found = veth_links(container_links);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "eth0");
    assert_eq!(found[0].parent_index, host_end.ifindex());

    Ok(())
}

#[tokio::test]
async fn test_rename_host_end() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("host")?;
    let container = TestNamespace::new("ctr")?;
    host.connect_to(&container, "vethtest1", "eth0")?;

    let container_links = veth_links(container.connection()?.get_links().await?);
    let eth0 = &container_links[0];

    let namer = LinkNamer::new(Config::new().link_prefix("eth").separator("-"));
    let target = namer.host_link_name("/my/random_web", &eth0.name).unwrap();

    let renamer = Renamer::new(host.connection()?, false);
    let link = renamer.resolve(eth0.parent_index).await.unwrap();
    assert_eq!(link.name, "vethtest1");
    assert_eq!(
        renamer.rename(&link, &target, "/my/random_web", &eth0.name).await,
        RenameOutcome::Renamed
    );

    let link = renamer.links().link_by_index(eth0.parent_index).await.unwrap();
    assert_eq!(link.name, "vrandom_web-0");
    assert_eq!(
        renamer.rename(&link, &target, "/my/random_web", &eth0.name).await,
        RenameOutcome::Unchanged
    );

    Ok(())
}

#[tokio::test]
async fn test_rename_missing_link() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("miss")?;
    let conn = host.connection()?;

    assert!(conn.get_link_by_index(4242).await?.is_none());
    let err = conn.set_link_name_by_index(4242, "vnothing-0").await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_enter_namespace_and_return() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("enter")?;
    ns.add_dummy("dummy7")?;

    {
        let _guard = namespace::enter_path(ns.path())?;
        let conn = veth_namer::netlink::Connection::new()?;
        let links = conn.get_links().await?;
        assert!(links.iter().any(|l| l.name() == Some("dummy7")));
    }

    // Back in the original namespace.
    let conn = veth_namer::netlink::Connection::new()?;
    let links = conn.get_links().await?;
    assert!(!links.iter().any(|l| l.name() == Some("dummy7")));

    Ok(())
}
