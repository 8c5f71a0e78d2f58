use std::cmp::Ordering;

use crafd_common::{Organization, SortDirection, SortField};

/// Sort organizations in place. Ties fall back to name ascending so the order is
/// stable across runs regardless of direction.
pub fn sort_organizations(organizations: &mut [Organization], field: SortField, direction: SortDirection) {
    organizations.sort_by(|a, b| {
        let primary = match field {
            SortField::Name => compare_names(a, b),
            SortField::Donors => a
                .all_donor_countries()
                .len()
                .cmp(&b.all_donor_countries().len()),
            SortField::Assets => a.project_count.cmp(&b.project_count),
        };
        let primary = match direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| compare_names(a, b))
    });
}

fn compare_names(a: &Organization, b: &Organization) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(name: &str, donors: &[&str], project_count: usize) -> Organization {
        Organization {
            id: name.to_string(),
            name: name.to_string(),
            short_name: None,
            org_type: None,
            website: None,
            description: None,
            hq_country: None,
            donor_countries: donors.iter().map(|d| d.to_string()).collect(),
            agencies: vec![],
            projects: vec![],
            project_count,
        }
    }

    fn names(orgs: &[Organization]) -> Vec<&str> {
        orgs.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut orgs = vec![org("beta", &[], 0), org("Alpha", &[], 0), org("Gamma", &[], 0)];
        sort_organizations(&mut orgs, SortField::Name, SortDirection::Asc);
        assert_eq!(names(&orgs), vec!["Alpha", "beta", "Gamma"]);
        sort_organizations(&mut orgs, SortField::Name, SortDirection::Desc);
        assert_eq!(names(&orgs), vec!["Gamma", "beta", "Alpha"]);
    }

    #[test]
    fn asset_sort_breaks_ties_by_name() {
        let mut orgs = vec![org("B", &[], 2), org("C", &[], 5), org("A", &[], 2)];
        sort_organizations(&mut orgs, SortField::Assets, SortDirection::Desc);
        assert_eq!(names(&orgs), vec!["C", "A", "B"]);
    }

    #[test]
    fn donor_sort_counts_distinct_donors() {
        let mut orgs = vec![org("A", &["Germany"], 0), org("B", &["Germany", "Canada"], 0)];
        sort_organizations(&mut orgs, SortField::Donors, SortDirection::Desc);
        assert_eq!(names(&orgs), vec!["B", "A"]);
    }
}
